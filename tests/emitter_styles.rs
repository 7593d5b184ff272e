use indoc::indoc;
use saphyr_meta::{
    CollectionStyle, Data, Document, EmitOptions, Mapper, MetadataStore, Primitive,
    RenderOptions, ScalarStyle, Value, emit_options, yaml_object,
};

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Tagged {
        pub number: Data,
    }
}

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Boss {
        pub name: String,
    }
}

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Org {
        pub ceo: Boss,
    }
}

fn round_trip(yaml: &str) -> String {
    saphyr_meta::parse_str(yaml)
        .expect("valid YAML")
        .to_yaml_string()
        .expect("emits")
}

fn emit_with(yaml: &str, options: &EmitOptions) -> String {
    let doc = saphyr_meta::parse_str(yaml).expect("valid YAML");
    saphyr_meta::to_string_with_options(&doc, options, &RenderOptions::default()).expect("emits")
}

#[test]
fn unchanged_documents_round_trip() {
    let yaml = indoc! {r#"
        # service settings
        name: api
        number: !!int "42"
        quoted: 'single'
        ports: [80, 443]
        limits: {cpu: 2, memory: 512}
        notes: |
          first line
          second line
        summary: >
          folded text
        hosts:
          - alpha
          # the backup
          - beta
        answer: no
        switch: on
        y: 2
        words: [yes, off, n]
    "#};
    assert_eq!(round_trip(yaml), yaml);
}

#[test]
fn tagged_nulls_keep_their_tags() {
    assert_eq!(
        round_trip("color: !color ~\ncount: !!int\nplain: ~\n"),
        "color: !color null\ncount: null\nplain: null\n"
    );
}

#[test]
fn yaml11_words_can_be_quoted_for_older_readers() {
    let options = emit_options! { yaml11_booleans: true };
    assert_eq!(
        emit_with("answer: no\ny: 2\nlist: [on]\n", &options),
        "answer: \"no\"\n\"y\": 2\nlist: [\"on\"]\n"
    );
}

#[test]
fn stale_standard_tag_is_dropped_but_quotes_stay() {
    let mapper = Mapper::new();
    let mut tagged: Tagged = mapper.from_str("number: !!int \"42\"\n").expect("maps");
    assert_eq!(tagged.number, Data::Primitive(Primitive::Int(42)));
    assert_eq!(
        mapper.to_string(&tagged).expect("emits"),
        "number: !!int \"42\"\n"
    );

    tagged.number = Data::string("forty-two");
    assert_eq!(
        mapper.to_string(&tagged).expect("emits"),
        "number: \"forty-two\"\n"
    );
}

#[test]
fn custom_tags_are_always_written() {
    let mapper = Mapper::new();
    let mut tagged: Tagged = mapper.from_str("number: !celsius 21\n").expect("maps");
    tagged.number = Data::string("warm");
    assert_eq!(
        mapper.to_string(&tagged).expect("emits"),
        "number: !celsius warm\n"
    );
}

#[test]
fn nested_layout_can_be_changed_through_metadata() {
    let mapper = Mapper::new();
    let mut org: Org = mapper.from_str("ceo: {name: x}\n").expect("maps");
    assert_eq!(mapper.to_string(&org).expect("emits"), "ceo: {name: x}\n");

    org.metadata
        .set_property_mapping_style("ceo", Some(CollectionStyle::Block));
    assert_eq!(mapper.to_string(&org).expect("emits"), "ceo:\n  name: x\n");
}

#[test]
fn omit_null_skips_mapping_entries_only() {
    let yaml = "a: 1\nb: null\nc: [x, null]\n";
    assert_eq!(
        emit_with(yaml, &emit_options! { omit_null: true }),
        "a: 1\nc: [x, null]\n"
    );
    assert_eq!(emit_with(yaml, &EmitOptions::default()), yaml);
}

#[test]
fn runtime_types_supply_missing_tags() {
    let yaml = "a: 1\nb: text\nc: true\nd: 1.5\ne: !custom x\n";
    let options = emit_options! { emit_missing_tags_from_runtime_type: true };
    assert_eq!(
        emit_with(yaml, &options),
        "a: !!int 1\nb: !!str text\nc: !!bool true\nd: !!float 1.5\ne: !custom x\n"
    );
}

#[test]
fn style_overrides_beat_stored_styles() {
    let flow = emit_options! { mapping_style_override: Some(CollectionStyle::Flow) };
    assert_eq!(emit_with("a:\n  b: 1\n", &flow), "{a: {b: 1}}\n");

    let block = emit_options! { sequence_style_override: Some(CollectionStyle::Block) };
    assert_eq!(
        emit_with("items: [1, 2]\n", &block),
        "items:\n  - 1\n  - 2\n"
    );
}

#[test]
fn edited_strings_pick_a_style_that_reads_back() {
    let mut doc = saphyr_meta::parse_str("name: Bob\nbio: short\n").expect("valid YAML");
    if let Value::Mapping(entries) = &mut doc.value {
        entries[0].1 = Value::string("123");
        entries[1].1 = Value::string("line one\nline two\n");
    }
    assert_eq!(
        doc.to_yaml_string().expect("emits"),
        "name: \"123\"\nbio: \"line one\\nline two\\n\"\n"
    );

    doc.metadata.set_property_scalar_style("bio", Some(ScalarStyle::Literal));
    assert_eq!(
        doc.to_yaml_string().expect("emits"),
        "name: \"123\"\nbio: |\n  line one\n  line two\n"
    );
}

#[test]
fn comments_come_from_metadata() {
    let mut metadata = MetadataStore::new();
    metadata.set_property_comment("port", Some("listening port\nchange with care"));
    let value = Value::Mapping(vec![
        ("port".to_string(), Value::scalar(Primitive::Int(8080))),
        ("host".to_string(), Value::string("localhost")),
    ]);
    let doc = Document::new(value, metadata);
    assert_eq!(
        saphyr_meta::to_string(&doc).expect("emits"),
        "# listening port\n# change with care\nport: 8080\nhost: localhost\n"
    );
}

#[test]
fn streams_are_separated() {
    let docs = saphyr_meta::parse_all("a: 1\n---\n- x\n").expect("valid stream");
    assert_eq!(
        saphyr_meta::to_string_all(&docs).expect("emits"),
        "a: 1\n---\n- x\n"
    );
}

#[test]
fn indent_step_is_configurable() {
    let doc = saphyr_meta::parse_str("a:\n  b:\n    - c\n").expect("valid YAML");
    let render = saphyr_meta::render_options! { indent_step: 4 };
    assert_eq!(
        saphyr_meta::to_string_with_options(&doc, &EmitOptions::default(), &render)
            .expect("emits"),
        "a:\n    b:\n        - c\n"
    );
}
