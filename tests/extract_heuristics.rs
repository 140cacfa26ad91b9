use serde_json::json;
use wf_hooks_rs::extract::json_from_text;

#[test]
fn whole_text_tier_wins_first() {
    let value = json_from_text("  {\"total\": 3, \"items\": [1, 2, 3]}  ").expect("value");
    assert_eq!(value, json!({ "total": 3, "items": [1, 2, 3] }));
}

#[test]
fn extraction_is_unaffected_by_surrounding_prose() {
    let text = "Here is the report you asked for:\n\n\
                ```json\n{\"total\": 3}\n```\n\nLet me know if anything is off.";
    assert_eq!(json_from_text(text), Some(json!({ "total": 3 })));
}

#[test]
fn untagged_fence_is_parsed_too() {
    let text = "result:\n```\n{\"ok\": true}\n```";
    assert_eq!(json_from_text(text), Some(json!({ "ok": true })));
}

#[test]
fn later_fenced_block_is_tried_when_the_first_fails() {
    let text = "```json\nnot json at all\n```\nthen\n```json\n{\"ok\": 1}\n```";
    assert_eq!(json_from_text(text), Some(json!({ "ok": 1 })));
}

#[test]
fn brace_scan_handles_nesting() {
    let text = "The step produced {\"outer\": {\"inner\": [1, 2]}} as output.";
    assert_eq!(
        json_from_text(text),
        Some(json!({ "outer": { "inner": [1, 2] } }))
    );
}

#[test]
fn extraction_matches_canonical_reparse() {
    let embedded = json!({ "name": "build", "attempts": 2 });
    let text = format!("prefix {} suffix", embedded);
    assert_eq!(json_from_text(&text), Some(embedded));
}

#[test]
fn prose_without_data_yields_none() {
    assert_eq!(json_from_text("please fetch the latest figures"), None);
    assert_eq!(json_from_text(""), None);
    assert_eq!(json_from_text("   \n\t"), None);
}

#[test]
fn first_brace_span_is_the_only_attempt() {
    let text = "set {x} then emit {\"x\": 1}";
    assert_eq!(json_from_text(text), None);
}
