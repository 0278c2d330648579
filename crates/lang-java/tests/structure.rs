mod common;

use common::{
    child_kinds, labelled, labels, nodes_of, parent_kind, structure, structure_with, text_of,
};
use jscope_core::editor::ParseOptions;
use jscope_core::tree::{NodeData, NodeKind, SourceTree};
use jscope_core::types::TypeResolution;
use jscope_java::{ClassPath, parse_structure};

const COUNTER: &str = "package demo;

import java.util.List;

/** A counter. */
public class Counter {
    private int count = 0; // running total

    /**
     * Adds all values.
     */
    public int addAll(List<Integer> values) {
        for (int v : values) {
            count += v;
        }
        while (count > 100) count -= 100;
        return count;
    }
}
";

fn only(tree: &SourceTree, kind: NodeKind) -> jscope_core::tree::NodeId {
    let nodes = nodes_of(tree, kind);
    assert_eq!(nodes.len(), 1, "expected one {kind}\n{tree}");
    nodes[0]
}

#[test]
fn test_counter_outline() {
    let tree = structure(COUNTER);
    assert!(tree.syntax_errors().is_empty());
    assert_eq!(
        child_kinds(&tree, tree.root()),
        vec![NodeKind::Package, NodeKind::Import, NodeKind::Type]
    );

    let ty = labelled(&tree, NodeKind::Type, "Counter");
    assert_eq!(child_kinds(&tree, ty), vec![NodeKind::Comment, NodeKind::TypeBody]);
    assert!(text_of(COUNTER, &tree, ty).starts_with("/** A counter. */\npublic class"));
    assert!(text_of(COUNTER, &tree, ty).ends_with('}'));

    let body = only(&tree, NodeKind::TypeBody);
    assert_eq!(
        child_kinds(&tree, body),
        vec![NodeKind::Field, NodeKind::Comment, NodeKind::Method]
    );
    let field = labelled(&tree, NodeKind::Field, "count");
    assert_eq!(text_of(COUNTER, &tree, field), "private int count = 0;");
}

#[test]
fn test_javadoc_starts_the_method() {
    let tree = structure(COUNTER);
    let method = labelled(&tree, NodeKind::Method, "addAll");
    let text = text_of(COUNTER, &tree, method);
    assert!(text.starts_with("/**\n     * Adds all values.\n     */\n    public int addAll"));
    assert!(text.ends_with("return count;\n    }"));
    assert_eq!(child_kinds(&tree, method), vec![NodeKind::Comment, NodeKind::MethodBody]);
}

#[test]
fn test_loop_bodies() {
    let tree = structure(COUNTER);
    let method_body = only(&tree, NodeKind::MethodBody);
    assert_eq!(
        child_kinds(&tree, method_body),
        vec![NodeKind::Loop, NodeKind::Loop, NodeKind::Expression]
    );
    let loops = nodes_of(&tree, NodeKind::Loop);

    // a braced body attaches directly to the loop
    assert_eq!(child_kinds(&tree, loops[0]), vec![NodeKind::Expression, NodeKind::BlockBody]);
    let iterable = tree.node(loops[0]).children[0];
    assert_eq!(text_of(COUNTER, &tree, iterable), "values");

    assert_eq!(child_kinds(&tree, loops[1]), vec![NodeKind::Expression, NodeKind::LoopBody]);
    let condition = tree.node(loops[1]).children[0];
    assert_eq!(text_of(COUNTER, &tree, condition), "count > 100");
    let body = only(&tree, NodeKind::LoopBody);
    assert_eq!(text_of(COUNTER, &tree, body), "count -= 100;");
}

#[test]
fn test_options_drop_comments_and_expressions() {
    let without_comments = structure_with(
        COUNTER,
        ParseOptions {
            attach_comments: false,
            expressions: true,
        },
    );
    assert!(nodes_of(&without_comments, NodeKind::Comment).is_empty());
    assert!(!nodes_of(&without_comments, NodeKind::Expression).is_empty());

    let without_expressions = structure_with(
        COUNTER,
        ParseOptions {
            attach_comments: true,
            expressions: false,
        },
    );
    assert!(nodes_of(&without_expressions, NodeKind::Expression).is_empty());
    assert_eq!(nodes_of(&without_expressions, NodeKind::Loop).len(), 2);
    assert_eq!(nodes_of(&without_expressions, NodeKind::Comment).len(), 3);
}

#[test]
fn test_enum_constants_with_bodies() {
    let text = r#"enum Op {
    PLUS("+") {
        int apply(int a, int b) { return a + b; }
    },
    NEG("-");

    private final String symbol;

    Op(String symbol) { this.symbol = symbol; }

    int apply(int a, int b) { throw new UnsupportedOperationException(); }
}
"#;
    let tree = structure(text);
    assert_eq!(labels(&tree, NodeKind::Type), vec!["Op", "<anonymous>"]);
    assert_eq!(labels(&tree, NodeKind::Method), vec!["apply", "Op", "apply"]);

    let constant = labelled(&tree, NodeKind::Type, "<anonymous>");
    let constant_text = text_of(text, &tree, constant);
    assert!(constant_text.starts_with("PLUS(\"+\") {"));
    assert!(constant_text.ends_with("a + b; }\n    }"));
    assert_eq!(parent_kind(&tree, constant), Some(NodeKind::TypeBody));

    let arguments = nodes_of(&tree, NodeKind::Expression)
        .into_iter()
        .find(|&id| parent_kind(&tree, id) == Some(NodeKind::TypeBody))
        .unwrap();
    assert_eq!(text_of(text, &tree, arguments), "(\"-\")");
}

#[test]
fn test_lambda_and_anonymous_class_in_expressions() {
    let text = "import java.util.List;

class Tasks {
    void run(List<String> names) {
        names.forEach(n -> {
            System.out.println(n);
        });
        Runnable r = new Runnable() {
            public void run() {}
        };
    }
}
";
    let tree = structure(text);
    let outer_body = tree.node(labelled(&tree, NodeKind::Method, "run")).children[0];
    assert_eq!(tree.node(outer_body).kind, NodeKind::MethodBody);
    assert_eq!(
        child_kinds(&tree, outer_body),
        vec![NodeKind::Expression, NodeKind::Expression]
    );

    let call = tree.node(outer_body).children[0];
    assert_eq!(child_kinds(&tree, call), vec![NodeKind::Block]);
    let lambda = tree.node(call).children[0];
    assert_eq!(child_kinds(&tree, lambda), vec![NodeKind::BlockBody]);
    let statements = tree.node(lambda).children[0];
    assert_eq!(child_kinds(&tree, statements), vec![NodeKind::Expression]);

    let creation = tree.node(outer_body).children[1];
    assert_eq!(child_kinds(&tree, creation), vec![NodeKind::Type]);
    let anonymous = tree.node(creation).children[0];
    assert!(text_of(text, &tree, anonymous).starts_with("Runnable() {"));
    assert_eq!(labels(&tree, NodeKind::Method), vec!["run", "run"]);
}

#[test]
fn test_record_with_compact_constructor_and_switch() {
    let text = r#"record Point(int x, int y) {
    Point {
        if (x < 0) throw new IllegalArgumentException();
    }

    String quadrant() {
        return switch (x) {
            case 0 -> "axis";
            default -> {
                yield "plane";
            }
        };
    }
}
"#;
    let tree = structure(text);
    assert_eq!(labels(&tree, NodeKind::Type), vec!["Point"]);
    assert_eq!(labels(&tree, NodeKind::Method), vec!["Point", "quadrant"]);

    let conditional = only(&tree, NodeKind::Conditional);
    assert_eq!(
        child_kinds(&tree, conditional),
        vec![NodeKind::Expression, NodeKind::ConditionalBranch]
    );
    let branch = only(&tree, NodeKind::ConditionalBranch);
    assert_eq!(
        text_of(text, &tree, branch),
        "throw new IllegalArgumentException();"
    );

    let quadrant = labelled(&tree, NodeKind::Method, "quadrant");
    let body = tree.node(quadrant).children[0];
    let returned = tree.node(body).children[0];
    assert_eq!(child_kinds(&tree, returned), vec![NodeKind::Block]);
    let cases = tree.node(tree.node(returned).children[0]).children[0];
    assert_eq!(
        child_kinds(&tree, cases),
        vec![NodeKind::Expression, NodeKind::Block]
    );
}

#[test]
fn test_try_with_resources() {
    let text = r#"import java.io.*;

class Io {
    String read(File f) throws IOException {
        try (Reader r = new FileReader(f)) {
            return "" + r.read();
        } catch (IllegalStateException | UncheckedIOException e) {
            return null;
        } finally {
            System.out.println("done");
        }
    }
}
"#;
    let tree = structure(text);
    let statement = only(&tree, NodeKind::TryStatement);
    assert_eq!(
        child_kinds(&tree, statement),
        vec![
            NodeKind::Expression,
            NodeKind::TryBlock,
            NodeKind::BlockBody,
            NodeKind::BlockBody
        ]
    );
    let resource = tree.node(statement).children[0];
    assert_eq!(text_of(text, &tree, resource), "new FileReader(f)");
    let guarded = only(&tree, NodeKind::TryBlock);
    assert_eq!(child_kinds(&tree, guarded), vec![NodeKind::Expression]);
    assert!(text_of(text, &tree, statement).starts_with("try ("));
}

#[test]
fn test_nested_and_local_types_are_qualified() {
    let text = "package p;

class Outer {
    static class Nested {}

    void f() {
        class Local {}
    }
}
";
    let tree = structure(text);
    let qualified: Vec<_> = nodes_of(&tree, NodeKind::Type)
        .into_iter()
        .filter_map(|id| match &tree.node(id).data {
            NodeData::Type { qualified_name, .. } => qualified_name.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(qualified, vec!["p.Outer", "p.Outer.Nested", "p.Outer.Local"]);
}

#[test]
fn test_comment_inside_expression() {
    let text = "class A {\n    int x = compute(/* inline */ 1);\n}\n";
    let tree = structure(text);
    let comment = only(&tree, NodeKind::Comment);
    assert_eq!(parent_kind(&tree, comment), Some(NodeKind::Expression));
    assert_eq!(text_of(text, &tree, comment), "/* inline */");
}

#[test]
fn test_return_type_with_shift_token() {
    let text = "import java.util.*;

class Registry {
    Map<String, List<Integer>> entries;

    Map<String, List<Integer>> build() { return null; }
}
";
    let tree = structure(text);
    let field = labelled(&tree, NodeKind::Field, "entries");
    match &tree.node(field).data {
        NodeData::Field { type_spec, .. } => assert_eq!(type_spec, "Map<String, List<Integer>>"),
        other => panic!("unexpected field data {other:?}"),
    }
    let method = labelled(&tree, NodeKind::Method, "build");
    match &tree.node(method).data {
        NodeData::Method {
            return_type: Some(TypeResolution::Resolved(ty)),
            ..
        } => assert_eq!(
            ty.to_string(),
            "java.util.Map<java.lang.String, java.util.List<java.lang.Integer>>"
        ),
        other => panic!("unexpected method data {other:?}"),
    }
}

#[test]
fn test_syntax_errors_are_recorded() {
    let text = "class Broken {\n    void f() {\n        int x = ;\n    }\n}\n";
    let tree = parse_structure(text, &ClassPath::with_builtins(), ParseOptions::default()).unwrap();
    assert!(!tree.syntax_errors().is_empty());
    for message in tree.syntax_errors() {
        assert!(message.starts_with("syntax error at "), "{message}");
    }
    assert_eq!(labels(&tree, NodeKind::Type), vec!["Broken"]);
}

#[test]
fn test_empty_unit() {
    let tree = structure("");
    assert!(tree.is_empty());
    let tree = structure("// nothing here\n");
    assert_eq!(child_kinds(&tree, tree.root()), vec![NodeKind::Comment]);
}
