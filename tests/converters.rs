use saphyr_meta::{
    Converter, Data, Error, Mapper, Primitive, PropertyType, Result, yaml_object,
};

/// Reads `21.5C` style temperatures tagged `!temp`.
struct Celsius;

impl Converter for Celsius {
    fn can_handle(&self, tag: Option<&str>, target: &PropertyType) -> bool {
        tag == Some("!temp") && *target == PropertyType::Float
    }

    fn from_yaml(&self, data: Data, _tag: Option<&str>, _target: &PropertyType) -> Result<Data> {
        let text = match &data {
            Data::Primitive(Primitive::String(s)) => s.clone(),
            other => {
                return Err(Error::Converter {
                    converter: "celsius".into(),
                    msg: format!("expected text, got {other:?}"),
                });
            }
        };
        let degrees = text
            .strip_suffix('C')
            .and_then(|n| n.parse::<f64>().ok())
            .ok_or_else(|| Error::Converter {
                converter: "celsius".into(),
                msg: format!("`{text}` is not a temperature"),
            })?;
        Ok(Data::Primitive(Primitive::Float(degrees)))
    }

    fn to_yaml(&self, value: &Data) -> Result<(String, Option<String>)> {
        match value {
            Data::Primitive(Primitive::Float(v)) => Ok((format!("{v}C"), Some("!temp".into()))),
            other => Err(Error::Converter {
                converter: "celsius".into(),
                msg: format!("cannot write {other:?}"),
            }),
        }
    }
}

/// Prefixes the value with the tag it was read with.
struct TagEcho;

impl Converter for TagEcho {
    fn can_handle(&self, _tag: Option<&str>, _target: &PropertyType) -> bool {
        true
    }

    fn from_yaml(&self, data: Data, tag: Option<&str>, _target: &PropertyType) -> Result<Data> {
        let text = match data {
            Data::Primitive(p) => p.to_string(),
            _ => String::new(),
        };
        Ok(Data::string(format!("{}|{text}", tag.unwrap_or("-"))))
    }

    fn to_yaml(&self, value: &Data) -> Result<(String, Option<String>)> {
        let text = match value {
            Data::Primitive(Primitive::String(s)) => s.rsplit('|').next().unwrap_or_default(),
            _ => "",
        };
        Ok((text.to_string(), None))
    }
}

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Reading {
        pub sensor: String,
        #[yaml(converter = "celsius")]
        pub temperature: f64,
    }
}

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Echo {
        #[yaml(converter = "echo")]
        pub value: String,
    }
}

fn mapper() -> Mapper {
    let mut mapper = Mapper::new();
    mapper
        .register_converter("celsius", Celsius)
        .register_converter("echo", TagEcho);
    mapper
}

#[test]
fn converter_reads_and_writes_the_property() {
    let mapper = mapper();
    let reading: Reading = mapper
        .from_str("sensor: roof\ntemperature: !temp 21.5C\n")
        .expect("converter accepts the value");
    assert_eq!(reading.temperature, 21.5);
    assert_eq!(reading.metadata.property_tag("temperature"), Some("!temp"));

    let text = mapper.to_string(&reading).expect("emits");
    assert_eq!(text, "sensor: roof\ntemperature: !temp 21.5C\n");
}

#[test]
fn converter_tag_applies_to_new_instances() {
    let reading = Reading {
        sensor: "cellar".into(),
        temperature: 12.0,
        ..Reading::default()
    };
    let text = mapper().to_string(&reading).expect("emits");
    assert_eq!(text, "sensor: cellar\ntemperature: !temp 12C\n");
}

#[test]
fn converter_sees_the_tag_of_the_value() {
    let mapper = mapper();
    let echo: Echo = mapper.from_str("value: !note hello\n").expect("maps");
    assert_eq!(echo.value, "!note|hello");

    let untagged: Echo = mapper.from_str("value: hello\n").expect("maps");
    assert_eq!(untagged.value, "-|hello");

    // No tag from the converter: the stored one is written back.
    let text = mapper.to_string(&echo).expect("emits");
    assert_eq!(text, "value: !note hello\n");
}

#[test]
fn unknown_converter_is_a_resolution_error() {
    let err = Mapper::new()
        .from_str::<Reading>("temperature: !temp 1C\n")
        .expect_err("celsius is not registered");
    assert!(matches!(err, Error::ConverterResolution { ref name } if name == "celsius"));
}

#[test]
fn declined_values_are_a_mismatch() {
    let err = mapper()
        .from_str::<Reading>("temperature: 21.5C\n")
        .expect_err("untagged value is declined");
    match err {
        Error::ConverterMismatch {
            converter,
            tag,
            target_type,
        } => {
            assert_eq!(converter, "celsius");
            assert_eq!(tag, None);
            assert_eq!(target_type, PropertyType::Float.to_string());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn converter_failures_propagate() {
    let err = mapper()
        .from_str::<Reading>("temperature: !temp warm\n")
        .expect_err("not a temperature");
    assert!(matches!(err, Error::Converter { .. }));
}
