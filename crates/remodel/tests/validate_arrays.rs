use remodel::{Each, Model, Pattern, Step, Verdict};
use serde_json::{json, Value};

fn non_empty_string(value: Option<&Value>, _data: &Value, _path: &[Step]) -> Verdict {
    match value.and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Verdict::Pass,
        _ => Verdict::fail("value is required"),
    }
}

fn positive_number(value: Option<&Value>, _data: &Value, _path: &[Step]) -> Verdict {
    match value.and_then(Value::as_i64) {
        Some(n) if n > 0 => Verdict::Pass,
        _ => Verdict::fail("must be positive"),
    }
}

fn phones_model(phones: Value) -> Model {
    Model::builder("id", json!({"id": null, "phones": phones}))
        .with_pattern(Pattern::new().each(
            "phones",
            Each::sub(Pattern::new().rule("number", non_empty_string)),
        ))
        .build()
        .unwrap()
}

#[test]
fn scalar_array_children_follow_length() {
    let model = Model::builder("id", json!({"id": null, "values": [1, -2]}))
        .with_pattern(Pattern::new().each("values", Each::rule(positive_number)))
        .build()
        .unwrap();
    let values = model.v().child("values").unwrap();

    assert_eq!(values.children_len(), 2);
    assert!(!values.item(0).unwrap().self_invalid());
    assert!(values.item(1).unwrap().self_invalid());

    model.update(|data| data["values"].as_array_mut().unwrap().push(json!(3)));
    let values = model.v().child("values").unwrap();
    assert_eq!(values.children_len(), 3);
    assert!(!values.item(2).unwrap().self_invalid());

    model.update(|data| data["values"] = json!([1]));
    assert_eq!(model.v().child("values").unwrap().children_len(), 1);
    assert!(!model.v().invalid());
}

#[test]
fn array_self_rule_checks_the_array_value() {
    let model = Model::builder("id", json!({"id": null, "values": []}))
        .with_pattern(Pattern::new().each_with(
            "values",
            Each::rule(positive_number),
            |value: Option<&Value>, _data: &Value, _path: &[Step]| {
                match value.and_then(Value::as_array) {
                    Some(arr) if !arr.is_empty() => Verdict::Pass,
                    _ => Verdict::fail("at least one value required"),
                }
            },
        ))
        .build()
        .unwrap();

    let values = model.v().child("values").unwrap();
    assert!(values.self_invalid());
    assert_eq!(values.message(), "at least one value required");

    model.update(|data| data["values"] = json!([5]));
    assert!(!model.v().child("values").unwrap().self_invalid());
}

#[test]
fn removed_element_takes_its_state_with_it() {
    let model = phones_model(json!([{"number": "111"}, {"number": "222"}]));
    let phones = model.v().child("phones").unwrap();

    phones.item(0).unwrap().touch();
    assert!(phones.dirty());

    // Splice out the touched first element
    model.update(|data| data["phones"] = json!([{"number": "222"}]));

    let phones = model.v().child("phones").unwrap();
    assert_eq!(phones.children_len(), 1);
    assert!(!phones.dirty(), "the surviving element was never touched");
    assert_eq!(phones.item(0).unwrap().path(), "phones.[0]");
}

#[test]
fn surviving_element_keeps_state_across_reorder() {
    let model = phones_model(json!([{"number": "111"}, {"number": "222"}]));
    let phones = model.v().child("phones").unwrap();
    phones.item(0).unwrap().touch();

    model.update(|data| data["phones"] = json!([{"number": "222"}, {"number": "111"}]));

    let phones = model.v().child("phones").unwrap();
    assert!(!phones.item(0).unwrap().dirty());
    assert!(phones.item(1).unwrap().dirty(), "state followed the element");
    assert_eq!(phones.item(1).unwrap().path(), "phones.[1]");
    assert_eq!(
        phones.item(1).unwrap().child("number").unwrap().path(),
        "phones.[1].number"
    );
}

#[test]
fn inserted_element_gets_a_fresh_node() {
    let model = phones_model(json!([{"number": "111"}]));
    model.v().child("phones").unwrap().item(0).unwrap().touch();

    model.update(|data| data["phones"] = json!([{"number": ""}, {"number": "111"}]));

    let phones = model.v().child("phones").unwrap();
    assert_eq!(phones.children_len(), 2);
    assert!(phones.item(0).unwrap().invalid());
    assert!(!phones.item(0).unwrap().dirty());
    assert!(phones.item(1).unwrap().dirty());
}

#[test]
fn duplicate_elements_bind_distinct_nodes() {
    let model = phones_model(json!([{"number": "111"}, {"number": "111"}]));
    let phones = model.v().child("phones").unwrap();
    phones.item(0).unwrap().touch();

    model.update(|data| data["phones"] = json!([{"number": "111"}]));

    let phones = model.v().child("phones").unwrap();
    assert_eq!(phones.children_len(), 1);
    // First unconsumed match wins, so the touched node survived
    assert!(phones.item(0).unwrap().dirty());
}

#[test]
fn state_follows_elements_appended_after_construction() {
    let model = phones_model(json!([{"number": "111"}]));
    model.update(|data| {
        let phones = data["phones"].as_array_mut().unwrap();
        phones.push(json!({"number": "222"}));
        phones.push(json!({"number": "333"}));
    });

    let phones = model.v().child("phones").unwrap();
    assert_eq!(phones.children_len(), 3);
    phones.item(2).unwrap().touch();

    model.update(|data| {
        data["phones"] = json!([{"number": "333"}, {"number": "111"}, {"number": "222"}]);
    });

    let phones = model.v().child("phones").unwrap();
    assert!(
        phones.item(0).unwrap().dirty(),
        "state followed the appended element"
    );
    assert!(!phones.item(1).unwrap().dirty());
    assert!(!phones.item(2).unwrap().dirty());
    assert_eq!(phones.item(0).unwrap().path(), "phones.[0]");
    assert_eq!(
        phones.item(0).unwrap().child("number").unwrap().path(),
        "phones.[0].number"
    );
}

#[test]
fn edited_element_is_revalidated_in_place() {
    let model = phones_model(json!([{"number": "111"}]));
    let number = model
        .v()
        .child("phones")
        .unwrap()
        .item(0)
        .unwrap()
        .child("number")
        .unwrap();
    assert!(!number.self_invalid());

    model.update(|data| data["phones"][0]["number"] = json!(""));
    assert!(number.self_invalid());
    assert!(model.v().invalid());
}

#[test]
fn emptied_and_refilled_array() {
    let model = phones_model(json!([{"number": "111"}]));

    model.update(|data| data["phones"] = json!([]));
    assert_eq!(model.v().child("phones").unwrap().children_len(), 0);
    assert!(!model.v().invalid());

    model.update(|data| data["phones"] = json!([{"number": ""}, {"number": "x"}]));
    let phones = model.v().child("phones").unwrap();
    assert_eq!(phones.children_len(), 2);
    assert!(phones.item(0).unwrap().invalid());
}

#[test]
fn nested_arrays_of_arrays() {
    let model = Model::builder("id", json!({"id": null, "grid": [[1, 2], [-1]]}))
        .with_pattern(Pattern::new().each(
            "grid",
            Each::nested(remodel::ArrayPattern::new(Each::rule(positive_number))),
        ))
        .build()
        .unwrap();

    let grid = model.v().child("grid").unwrap();
    assert_eq!(grid.children_len(), 2);
    let row = grid.item(1).unwrap();
    assert_eq!(row.children_len(), 1);
    assert!(row.item(0).unwrap().self_invalid());
    assert!(model.v().invalid());

    model.update(|data| data["grid"][1][0] = json!(7));
    assert!(!model.v().invalid());
}
