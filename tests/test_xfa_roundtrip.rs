//! Integration tests for filling and reading XFA data trees.
//!
//! Covers the full workflow:
//! - skeleton from a template, values injected, values extracted again
//! - repeating groups with missing occurrences
//! - base tag enforcement
//! - template-declared repeats and stored choice codes
//! - XDP packet sessions

use serde_json::json;
use xfa_fieldmap::{
    build_skeleton, extract, inject, DataDocument, Error, FieldTree, MapperConfig, PacketSet,
    Skeleton, ValueExtractor, ValueInjector, XfaSession, XfaTemplate,
};

const APPLICATION: &[u8] = include_bytes!("fixtures/application.xdp");

fn tree(value: serde_json::Value) -> FieldTree {
    FieldTree::from_json(&value).expect("valid field tree")
}

fn skeleton(value: serde_json::Value) -> Skeleton {
    Skeleton::from_field_tree(&tree(value)).expect("rooted skeleton")
}

#[test]
fn test_fill_then_extract_names() {
    let shape = skeleton(json!({"form1": {"Name": {"First": "", "Last": ""}}}));
    let fields = tree(json!({"form1": {"Name": {"First": "Ann", "Last": "Lee"}}}));

    let mut doc = DataDocument::new_datasets();
    inject(&mut doc, "form1", &fields).expect("inject");

    let xml = doc.to_xml_string().unwrap();
    assert!(xml.contains("<form1><Name><First>Ann</First><Last>Lee</Last></Name></form1>"));
    assert_eq!(extract(&doc, &shape).unwrap(), fields);
}

#[test]
fn test_repeat_with_gap_is_backfilled() {
    let mut doc = DataDocument::new_datasets();
    let fields = tree(json!({"form1": {"Items": [{"Qty": "1"}, {"Qty": ""}, {"Qty": "3"}]}}));
    inject(&mut doc, "form1", &fields).unwrap();

    let xml = doc.to_xml_string().unwrap();
    assert!(xml.contains("<Items><Qty>1</Qty></Items><Items><Qty/></Items><Items><Qty>3</Qty></Items>"));

    let out = extract(&doc, &skeleton(json!({"form1": {"Items": [{"Qty": ""}]}}))).unwrap();
    assert_eq!(out, fields);
}

#[test]
fn test_only_last_occurrence_given() {
    let mut doc = DataDocument::parse(b"<form1/>").unwrap();
    let fields = tree(json!({"form1": {"Items": [{}, {}, {"Qty": "3"}]}}));
    let stats = inject(&mut doc, "form1", &fields).unwrap();

    assert_eq!(stats.leaves_written, 1);
    assert_eq!(
        doc.to_xml_string().unwrap(),
        "<form1><Items/><Items/><Items><Qty>3</Qty></Items></form1>"
    );
}

#[test]
fn test_base_tag_mismatch_leaves_tree_untouched() {
    let mut doc = DataDocument::parse(
        br#"<xfa:datasets xmlns:xfa="http://www.xfa.org/schema/xfa-data/1.0/"><xfa:data><form2><A>old</A></form2></xfa:data></xfa:datasets>"#,
    )
    .unwrap();
    let before = doc.clone();

    let result = inject(&mut doc, "form1", &tree(json!({"form1": {"A": "new"}})));
    match result {
        Err(Error::BaseTagMismatch { expected, found }) => {
            assert_eq!(expected, "form1");
            assert_eq!(found, "form2");
        },
        other => panic!("expected BaseTagMismatch, got {:?}", other),
    }
    assert_eq!(doc, before);

    // The field tree itself must be rooted at the expected base tag too.
    assert!(matches!(
        inject(&mut doc, "form2", &tree(json!({"form1": {"A": "new"}}))),
        Err(Error::BaseTagMismatch { .. })
    ));
    assert_eq!(doc, before);
}

#[test]
fn test_injection_is_idempotent() {
    let fields = tree(json!({"form1": {
        "Applicant": {"FamilyName": "Lee", "GivenName": "Ann"},
        "Items": [{"Qty": "1"}, {"Qty": "2"}]
    }}));
    let mut doc = DataDocument::new_datasets();
    inject(&mut doc, "form1", &fields).unwrap();
    let once = doc.to_xml_string().unwrap();

    let stats = inject(&mut doc, "form1", &fields).unwrap();
    assert_eq!(stats.elements_created, 0);
    assert_eq!(doc.to_xml_string().unwrap(), once);
}

#[test]
fn test_extraction_is_lenient() {
    let doc = DataDocument::parse(b"<form1><Unrelated>x</Unrelated></form1>").unwrap();
    let shape = skeleton(json!({"form1": {"A": "", "B": {"C": ""}, "Items": [{"Qty": ""}]}}));
    let out = extract(&doc, &shape).unwrap();
    assert_eq!(out, shape.to_field_tree());
}

#[test]
fn test_extra_occurrences_follow_config() {
    let doc = DataDocument::parse(
        b"<form1><Items><Qty>1</Qty></Items><Items><Qty>2</Qty></Items></form1>",
    )
    .unwrap();
    let shape = skeleton(json!({"form1": {"Items": [{"Qty": ""}]}}));

    let extended = ValueExtractor::new().extract(&doc, &shape).unwrap();
    assert_eq!(
        extended.to_json().unwrap(),
        json!({"form1": {"Items": [{"Qty": "1"}, {"Qty": "2"}]}})
    );

    let capped = ValueExtractor::with_config(MapperConfig::new().with_extend_repeats(false))
        .extract(&doc, &shape)
        .unwrap();
    assert_eq!(capped.to_json().unwrap(), json!({"form1": {"Items": [{"Qty": "1"}]}}));
}

#[test]
fn test_template_schema_rejects_unknown_intermediate() {
    let template = XfaTemplate::parse(APPLICATION).unwrap();
    let schema = template.schema();
    let mut doc = DataDocument::new_datasets();
    let before = doc.clone();

    let result = ValueInjector::new().inject(
        &mut doc,
        "form1",
        &tree(json!({"form1": {"Applicant": {"FamilyName": "Lee"}, "Spouse": {"Name": "Kim"}}})),
        Some(&schema),
    );
    assert!(matches!(result, Err(Error::PathNotFoundInSchema { .. })));
    assert_eq!(doc, before);

    // Without a template the same tree is accepted.
    ValueInjector::new()
        .inject(
            &mut doc,
            "form1",
            &tree(json!({"form1": {"Spouse": {"Name": "Kim"}}})),
            None,
        )
        .unwrap();
    assert!(doc.to_xml_string().unwrap().contains("<Spouse><Name>Kim</Name></Spouse>"));
}

#[test]
fn test_template_skeleton_from_xdp() {
    let template = XfaTemplate::parse(APPLICATION).unwrap();
    assert_eq!(template.base_tag(), "form1");
    assert_eq!(
        build_skeleton(&template).to_field_tree().to_json().unwrap(),
        json!({"form1": {
            "Applicant": {
                "FamilyName": "",
                "GivenName": "",
                "DOB": "",
                "Citizenship": "",
                "Sex": "",
                "Consent": ""
            },
            "Items": {"Qty": ""},
            "ArrivalTime": ""
        }})
    );
}

#[test]
fn test_session_over_xdp() {
    let packets = PacketSet::from_xdp(APPLICATION).unwrap();
    let names: Vec<&str> = packets.names().collect();
    assert_eq!(names, vec!["preamble", "config", "template", "datasets", "postamble"]);

    let mut session = XfaSession::new(packets);
    let current = session.values().unwrap();
    assert_eq!(
        current.to_json().unwrap()["form1"]["Applicant"],
        json!({
            "FamilyName": "Lee",
            "GivenName": "Ann",
            "DOB": "",
            "Citizenship": "",
            "Sex": "",
            "Consent": ""
        })
    );

    session
        .fill(&tree(json!({"form1": {
            "Applicant": {"Citizenship": "Canada", "DOB": "1990-05-01"},
            "ArrivalTime": "09:30"
        }})))
        .unwrap();

    let xdp = session.into_store().to_xdp();
    let reopened = XfaSession::new(PacketSet::from_xdp(&xdp).unwrap());
    let values = reopened.values().unwrap().to_json().unwrap();
    assert_eq!(values["form1"]["Applicant"]["FamilyName"], json!("Lee"));
    assert_eq!(values["form1"]["Applicant"]["Citizenship"], json!("Canada"));
    assert_eq!(values["form1"]["Applicant"]["DOB"], json!("1990-05-01"));
    assert_eq!(values["form1"]["ArrivalTime"], json!("09:30"));
    assert_eq!(values["form1"]["Items"], json!({"Qty": "1"}));
}

#[test]
fn test_declared_repeat_reads_every_occurrence() {
    let template = XfaTemplate::parse(APPLICATION).unwrap();
    let doc = DataDocument::parse(
        b"<form1><Items><Qty>1</Qty></Items><Items><Qty>2</Qty></Items><Items><Qty>3</Qty></Items></form1>",
    )
    .unwrap();

    let values = ValueExtractor::new().extract_with_template(&doc, &template).unwrap();
    assert_eq!(
        values.to_json().unwrap()["form1"]["Items"],
        json!([{"Qty": "1"}, {"Qty": "2"}, {"Qty": "3"}])
    );

    let capped = ValueExtractor::with_config(MapperConfig::new().with_extend_repeats(false))
        .extract_with_template(&doc, &template)
        .unwrap();
    assert_eq!(capped.to_json().unwrap()["form1"]["Items"], json!({"Qty": "1"}));
}

#[test]
fn test_session_reads_back_filled_rows() {
    let mut session = XfaSession::new(PacketSet::from_xdp(APPLICATION).unwrap());
    session
        .fill(&tree(json!({"form1": {"Items": [{"Qty": "1"}, {"Qty": "2"}]}})))
        .unwrap();
    let values = session.values().unwrap().to_json().unwrap();
    assert_eq!(values["form1"]["Items"], json!([{"Qty": "1"}, {"Qty": "2"}]));
}

#[test]
fn test_stored_choice_codes_read_as_captions() {
    let template = XfaTemplate::parse(APPLICATION).unwrap();
    let doc = DataDocument::parse(
        b"<form1><Applicant><Sex>1</Sex><Citizenship>USA</Citizenship></Applicant></form1>",
    )
    .unwrap();

    let values = ValueExtractor::new().extract_with_template(&doc, &template).unwrap();
    let applicant = &values.to_json().unwrap()["form1"]["Applicant"];
    assert_eq!(applicant["Sex"], json!("F"));
    assert_eq!(applicant["Citizenship"], json!("USA"));

    let raw = ValueExtractor::with_config(MapperConfig::new().with_decode_choice_values(false))
        .extract_with_template(&doc, &template)
        .unwrap();
    assert_eq!(raw.to_json().unwrap()["form1"]["Applicant"]["Sex"], json!("1"));
}

#[test]
fn test_pretty_printed_data_is_trimmed() {
    let template = XfaTemplate::parse(APPLICATION).unwrap();
    let doc = DataDocument::parse(
        b"<form1>\n  <Applicant>\n    <FamilyName>\n      Lee\n    </FamilyName>\n  </Applicant>\n</form1>",
    )
    .unwrap();
    let values = ValueExtractor::new().extract_with_template(&doc, &template).unwrap();
    assert_eq!(values.to_json().unwrap()["form1"]["Applicant"]["FamilyName"], json!("Lee"));
}

#[test]
fn test_session_rejects_other_form() {
    let mut session = XfaSession::new(PacketSet::from_xdp(APPLICATION).unwrap());
    assert!(matches!(
        session.fill(&tree(json!({"IMM_5257": {"A": "x"}}))),
        Err(Error::BaseTagMismatch { .. })
    ));
}

#[test]
fn test_form_packet_round_trip() {
    let mut doc = DataDocument::parse(
        br#"<form xmlns="http://www.xfa.org/schema/xfa-form/2.8/"><subform name="form1"><field name="A"/></subform></form>"#,
    )
    .unwrap();
    inject(&mut doc, "form1", &tree(json!({"form1": {"A": "x", "B": "y"}}))).unwrap();

    let xml = doc.to_xml_string().unwrap();
    assert!(xml.contains(r#"<field name="A"><value override="1"><text>x</text></value></field>"#));
    assert_eq!(
        extract(&doc, &skeleton(json!({"form1": {"A": "", "B": ""}}))).unwrap().to_json().unwrap(),
        json!({"form1": {"A": "x", "B": "y"}})
    );
}
