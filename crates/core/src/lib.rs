pub mod class_info;
pub mod editor;
pub mod entity;
pub mod error;
pub mod event;
pub mod info;
pub mod logging;
pub mod position;
pub mod resolve;
pub mod scope;
pub mod selection;
pub mod token;
pub mod tree;
pub mod types;

pub use class_info::{ClassInfo, MethodInfo, PackageInfo};
pub use editor::{EditorParser, ParseOptions};
pub use entity::{Entity, EntityResolver, ResolveContext};
pub use error::{JscopeError, Result, StructureError};
pub use event::{Construct, EventSink, Grammar, LoopKind, ParseEvent, TypeDefKind, TypeParam};
pub use info::InfoParser;
pub use selection::Selection;
pub use token::{LocatableToken, PrimitiveKind, TokenKind};
pub use tree::{NodeData, NodeId, NodeKind, SourceTree};
pub use types::{ClassType, JavaType, TypeArgument, TypeResolution, UnresolvedReason};
