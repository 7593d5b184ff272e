use indexmap::IndexMap;
use indoc::indoc;
use rust_decimal::Decimal;
use saphyr_meta::{
    CollectionStyle, Data, Error, Mapper, Primitive, PropertyType, TypedClass, YamlObject,
    yaml_object,
};

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Person {
        pub name: String,
        pub title: Option<String>,
    }
}

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Company {
        pub company_name: String,
        pub founded: i32,
        pub revenue: Decimal,
        pub listed: bool,
        pub ceo: Option<Person>,
        pub staff: Vec<Person>,
        pub tags: Vec<String>,
        pub labels: IndexMap<String, Data>,
        pub extra: Data,
    }
}

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    #[allow(non_snake_case)]
    pub struct Endpoint {
        #[yaml(key = "HTTP")]
        pub http_url: String,
        pub MaxConnections: i64,
    }
}

const COMPANY: &str = indoc! {"
    company-name: Acme
    founded: 1999
    revenue: 12.50
    listed: true
    ceo: {name: Alice, title: Chief}
    staff:
      # lead engineer
      - name: Bob
        title: Engineer
      - name: Carol
    tags: [tools, rockets]
    labels:
      env: prod
      region: eu-west
    extra: [1, two]
"};

#[test]
fn builds_nested_objects_and_lists() {
    let company: Company = Mapper::new().from_str(COMPANY).expect("maps onto Company");

    assert_eq!(company.company_name, "Acme");
    assert_eq!(company.founded, 1999);
    assert_eq!(company.revenue, Decimal::new(1250, 2));
    assert!(company.listed);

    let ceo = company.ceo.as_ref().expect("ceo present");
    assert_eq!(ceo.name, "Alice");
    assert_eq!(ceo.title.as_deref(), Some("Chief"));

    assert_eq!(company.staff.len(), 2);
    assert_eq!(company.staff[0].name, "Bob");
    assert_eq!(company.staff[1].title, None);

    assert_eq!(company.tags, ["tools", "rockets"]);
    assert_eq!(company.labels.get("env"), Some(&Data::string("prod")));
    assert_eq!(
        company.extra,
        Data::List(vec![
            Data::Primitive(Primitive::Int(1)),
            Data::string("two"),
        ])
    );
}

#[test]
fn metadata_is_split_between_parent_and_nested_instances() {
    let company: Company = Mapper::new().from_str(COMPANY).expect("maps onto Company");

    // Fields of a nested instance stay on the parent, its properties move with it.
    assert_eq!(
        company.metadata.property_mapping_style("ceo"),
        Some(CollectionStyle::Flow)
    );
    let ceo = company.ceo.as_ref().expect("ceo present");
    assert!(ceo.metadata.nested("name").is_some());
    let ceo_node = company.metadata.nested("ceo").expect("ceo node");
    assert!(ceo_node.nested("name").is_none());

    let staff = company.metadata.nested("staff").expect("staff node");
    assert_eq!(staff.sequence_style(), Some(CollectionStyle::Block));
    assert_eq!(
        staff.nested(0usize).and_then(|m| m.comment()),
        Some("lead engineer")
    );
    assert!(company.staff[0].metadata.nested("title").is_some());

    // Untyped values keep their whole subtree.
    assert_eq!(
        company.metadata.property_sequence_style("tags"),
        Some(CollectionStyle::Flow)
    );
    let labels = company.metadata.nested("labels").expect("labels node");
    assert!(labels.nested("region").is_some());
}

#[test]
fn missing_and_null_properties_keep_defaults() {
    let company: Company = Mapper::new()
        .from_str("company-name: Solo\nceo:\n")
        .expect("maps onto Company");
    assert_eq!(company.company_name, "Solo");
    assert_eq!(company.ceo, None);
    assert!(company.staff.is_empty());
    assert_eq!(company.extra, Data::Null);

    let empty: Company = Mapper::new().from_str("").expect("empty document");
    assert_eq!(empty, Company::default());
}

#[test]
fn unreadable_scalars_do_not_fail_the_mapping() {
    let yaml = indoc! {"
        company-name: Acme
        founded: nineteen-ninety-nine
        listed: 'true'
        revenue: '3.25'
        tags: [a, {not: scalar}, c]
    "};
    let company: Company = Mapper::new().from_str(yaml).expect("maps onto Company");
    assert_eq!(company.founded, 0);
    assert!(company.listed);
    assert_eq!(company.revenue, Decimal::new(325, 2));
    assert_eq!(company.tags, ["a", "c"]);
}

#[test]
fn non_mapping_items_in_object_lists_are_skipped() {
    let yaml = indoc! {"
        staff:
          - name: Bob
          - just a string
          - name: Carol
    "};
    let company: Company = Mapper::new().from_str(yaml).expect("maps onto Company");
    let names: Vec<&str> = company.staff.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Bob", "Carol"]);
}

#[test]
fn root_must_be_a_mapping() {
    let err = Mapper::new()
        .from_str::<Person>("- a\n- b\n")
        .expect_err("sequence root");
    assert!(matches!(err, Error::Message { .. }));
}

#[test]
fn keys_are_derived_from_property_names() {
    let keys: Vec<String> = Endpoint::descriptors().iter().map(|d| d.yaml_key()).collect();
    assert_eq!(keys, ["HTTP", "max-connections"]);

    let endpoint: Endpoint = Mapper::new()
        .from_str("HTTP: http://example.org\nmax-connections: 8\n")
        .expect("maps onto Endpoint");
    assert_eq!(endpoint.http_url, "http://example.org");
    assert_eq!(endpoint.MaxConnections, 8);
}

#[test]
fn descriptors_report_property_types() {
    let types: Vec<(&str, PropertyType)> = Company::descriptors()
        .iter()
        .map(|d| (d.host_name, d.property_type.clone()))
        .collect();
    assert_eq!(types[0], ("company_name", PropertyType::String));
    assert_eq!(types[4], ("ceo", PropertyType::Object("Person")));
    assert_eq!(
        types[5],
        ("staff", PropertyType::List(Box::new(PropertyType::Object("Person"))))
    );
    assert_eq!(types[7], ("labels", PropertyType::Map));
    assert_eq!(types[8], ("extra", PropertyType::Any));
}

#[test]
fn classes_can_be_built_by_name() {
    let mut mapper = Mapper::new();
    mapper.register_type::<Company>();
    assert!(mapper.registry().contains("Company"));
    assert!(mapper.registry().contains("Person"));

    let doc = saphyr_meta::parse_str("name: Dora\n").expect("valid YAML");
    let obj = mapper
        .from_value_named("Person", &doc.value, &doc.metadata)
        .expect("Person is registered");
    assert_eq!(obj.type_name(), "Person");
    let person = obj
        .as_any()
        .downcast_ref::<Person>()
        .expect("a Person instance");
    assert_eq!(person.name, "Dora");

    let err = mapper
        .from_value_named("Robot", &doc.value, &doc.metadata)
        .expect_err("Robot is not registered");
    assert!(matches!(err, Error::Type { ref type_name } if type_name == "Robot"));
}

/// A property type naming a class that never registers itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ghost;

impl saphyr_meta::Property for Ghost {
    fn property_type() -> PropertyType {
        PropertyType::Object("Ghost")
    }

    fn to_data(&self) -> Data {
        Data::Null
    }

    fn from_data(data: Data) -> Result<Self, Data> {
        Err(data)
    }
}

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Haunted {
        pub ghost: Option<Ghost>,
    }
}

#[test]
fn object_properties_need_a_registered_class() {
    let err = Mapper::new()
        .from_str::<Haunted>("ghost: {boo: 1}\n")
        .expect_err("Ghost is not a registered class");
    match err {
        Error::UnsupportedNestedType {
            property,
            type_name,
        } => {
            assert_eq!(property, "ghost");
            assert_eq!(type_name, "Ghost");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let haunted: Haunted = Mapper::new()
        .from_str("ghost:\n")
        .expect("null needs no class");
    assert_eq!(haunted.ghost, None);
}

#[test]
fn writes_properties_in_declaration_order() {
    let mut company = Company {
        company_name: "Fresh".into(),
        founded: 2020,
        ..Company::default()
    };
    company.tags = vec!["new".into()];
    company
        .metadata
        .set_property_sequence_style("tags", Some(CollectionStyle::Flow));
    let mapper = Mapper::new().with_emit_options(saphyr_meta::emit_options! { omit_null: true });
    let text = mapper.to_string(&company).expect("emits");
    assert_eq!(
        text,
        indoc! {"
            company-name: Fresh
            founded: 2020
            revenue: 0
            listed: false
            staff: []
            tags: [new]
            labels: {}
        "}
    );
}
