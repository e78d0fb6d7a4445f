use super::*;

#[test]
fn fallback_names_both_keys() {
    let d = FallbackDescriptions.description("古装", "B");
    assert!(d.contains("古装") && d.contains('B'));
}

#[test]
fn table_entries_win_and_gaps_fall_back() {
    let table = MapDescriptions::from_json_str(
        r#"{ "晚宴": { "D": "星空蓝闪钻晚宴裙", "E": "  " } }"#,
    )
    .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.description("晚宴", "D"), "星空蓝闪钻晚宴裙");
    assert_eq!(
        table.description("晚宴", "E"),
        FallbackDescriptions.description("晚宴", "E")
    );
    assert_eq!(
        table.description("日常", "A"),
        FallbackDescriptions.description("日常", "A")
    );
}

#[test]
fn malformed_table_is_a_serde_error() {
    let err = MapDescriptions::from_json_str(r#"{ "晚宴": ["D"] }"#).unwrap_err();
    assert!(matches!(err, RoomError::Serde(_)));
}

#[test]
fn inserted_entries_are_served() {
    let mut table = MapDescriptions::new();
    assert!(table.is_empty());
    table.insert("日常", "A", "暖金修身开衩裙");
    assert_eq!(table.description("日常", "A"), "暖金修身开衩裙");
}
