use saphyr_meta::{CollectionStyle, DuplicateKeyPolicy, EmitOptions, ParseOptions, RenderOptions};

#[test]
fn options_load_from_json() -> anyhow::Result<()> {
    let emit: EmitOptions = serde_json::from_str(
        r#"{
            "omit_null": true,
            "emit_missing_tags_from_runtime_type": false,
            "mapping_style_override": "Flow",
            "sequence_style_override": null,
            "max_depth": 5
        }"#,
    )?;
    assert!(emit.omit_null);
    assert_eq!(emit.mapping_style_override, Some(CollectionStyle::Flow));
    assert_eq!(emit.max_depth, 5);

    let parse: ParseOptions = serde_json::from_str(
        r#"{"duplicate_keys": "LastWins", "budget": null, "yaml11_booleans": true}"#,
    )?;
    assert_eq!(parse.duplicate_keys, DuplicateKeyPolicy::LastWins);
    assert!(parse.budget.is_none());

    let render: RenderOptions = serde_json::from_str(r#"{"indent_step": 4, "folded_wrap_chars": 60}"#)?;
    assert_eq!(render.indent_step, 4);
    Ok(())
}

#[test]
fn options_survive_a_json_round_trip() -> anyhow::Result<()> {
    let emit = saphyr_meta::emit_options! {
        sequence_style_override: Some(CollectionStyle::Block),
        max_depth: 12,
    };
    let json = serde_json::to_string(&emit)?;
    let back: EmitOptions = serde_json::from_str(&json)?;
    assert_eq!(back.sequence_style_override, Some(CollectionStyle::Block));
    assert_eq!(back.max_depth, 12);
    Ok(())
}

#[test]
fn zero_indent_step_is_rejected() -> anyhow::Result<()> {
    let doc = saphyr_meta::parse_str("a: 1\n")?;
    let render = saphyr_meta::render_options! { indent_step: 0 };
    let result = saphyr_meta::to_string_with_options(&doc, &EmitOptions::default(), &render);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn values_serialize_with_inferred_types() -> anyhow::Result<()> {
    let doc = saphyr_meta::parse_str("name: demo\nport: 8080\nratio: 0.5\ntags: [a, b]\nempty:\n")?;
    let json = serde_json::to_string(&doc.value)?;
    assert_eq!(
        json,
        r#"{"name":"demo","port":8080,"ratio":0.5,"tags":["a","b"],"empty":null}"#
    );
    Ok(())
}

#[test]
fn budget_reports_without_building_values() -> anyhow::Result<()> {
    let budget = saphyr_meta::Budget {
        max_nodes: 3,
        ..saphyr_meta::Budget::default()
    };
    let report = saphyr_meta::check_budget("[1, 2, 3, 4]\n", &budget)?;
    assert!(matches!(
        report.breached,
        Some(saphyr_meta::BudgetBreach::Nodes { .. })
    ));

    let report = saphyr_meta::check_budget("a: 1\n", &saphyr_meta::Budget::default())?;
    assert!(report.breached.is_none());
    assert_eq!(report.documents, 1);
    Ok(())
}
