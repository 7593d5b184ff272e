use indoc::indoc;
use saphyr_meta::{EmitOptions, Error, Mapper, RenderOptions, emit_options, yaml_object};

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Node {
        pub name: String,
        pub child: Option<Box<Node>>,
    }
}

fn node(name: &str, child: Option<Node>) -> Node {
    Node {
        name: name.to_string(),
        child: child.map(Box::new),
        ..Node::default()
    }
}

fn shallow_mapper() -> Mapper {
    Mapper::new().with_emit_options(emit_options! { max_depth: 3 })
}

#[test]
fn deep_instances_are_written_with_placeholders() {
    let chain = node("a", Some(node("b", Some(node("c", Some(node("d", None)))))));
    let text = shallow_mapper().to_string(&chain).expect("emits");
    assert_eq!(
        text,
        indoc! {"
            name: a
            child:
              name: b
              child:
                name: c
                child: {}
        "}
    );
}

#[test]
fn deep_documents_are_rejected_when_mapping() {
    let yaml = indoc! {"
        name: a
        child:
          name: b
          child:
            name: c
            child:
              name: d
    "};
    let err = shallow_mapper()
        .from_str::<Node>(yaml)
        .expect_err("four levels deep");
    assert!(matches!(err, Error::DepthLimit { depth: 4, max_depth: 3 }));

    let shallow: Node = shallow_mapper()
        .from_str("name: a\nchild:\n  name: b\n")
        .expect("two levels");
    assert_eq!(shallow.child.map(|c| c.name), Some("b".to_string()));
}

#[test]
fn recursive_classes_register_once() {
    let mut mapper = Mapper::new();
    mapper.register_type::<Node>();
    assert!(mapper.registry().contains("Node"));
}

#[test]
fn plain_documents_get_placeholders_too() {
    let doc = saphyr_meta::parse_str("a:\n  b:\n    c:\n      d: 1\n").expect("valid YAML");
    let text = saphyr_meta::to_string_with_options(
        &doc,
        &emit_options! { max_depth: 3 },
        &RenderOptions::default(),
    )
    .expect("emits");
    assert_eq!(text, "a:\n  b:\n    c: {}\n");

    let doc = saphyr_meta::parse_str("items:\n  - [1, 2]\n").expect("valid YAML");
    let text = saphyr_meta::to_string_with_options(
        &doc,
        &emit_options! { max_depth: 2 },
        &RenderOptions::default(),
    )
    .expect("emits");
    assert_eq!(text, "items:\n  - []\n");

    let text = saphyr_meta::to_string_with_options(
        &doc,
        &EmitOptions::default(),
        &RenderOptions::default(),
    )
    .expect("emits");
    assert_eq!(text, "items:\n  - [1, 2]\n");
}
