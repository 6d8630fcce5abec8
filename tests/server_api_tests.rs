use myrtle::config::Environment;
use myrtle::data::{DataStore, SpecsTable};
use myrtle::server::routes::route_request;
use myrtle::server::AppState;

fn state(environment: Environment) -> AppState {
    let store =
        DataStore::from_json_str(include_str!("../data/operators.json")).expect("sample parses");
    let specs =
        SpecsTable::from_yaml_str(include_str!("../data/specs.yaml")).expect("sample specs parse");
    AppState::new(store, specs, environment)
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("response should be valid json")
}

#[test]
fn health_endpoint_returns_ok_json() {
    let response = route_request(&state(Environment::Production), "GET", "/api/health", "");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type, "application/json");

    let payload = json(&response.body);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["operators"], 2);
}

#[test]
fn operator_list_is_sorted_by_id() {
    let response = route_request(&state(Environment::Production), "GET", "/api/operators?x=1", "");
    assert_eq!(response.status_code, 200);

    let payload = json(&response.body);
    let ids: Vec<&str> = payload["data"]
        .as_array()
        .expect("data should be an array")
        .iter()
        .filter_map(|item| item["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["char_002_amiya", "char_017_huang"]);
    assert_eq!(payload["data"][1]["modules"][0], "uniequip_002_huang");
}

#[test]
fn attributes_endpoint_returns_attributes_and_buff_list() {
    let body = r#"{"operatorId":"char_017_huang","phaseIndex":2,"level":90,"favor":100,
        "potentialRank":5,"equipId":"uniequip_002_huang","equipLevel":3}"#;
    let response = route_request(&state(Environment::Production), "POST", "/api/attributes", body);
    assert_eq!(response.status_code, 200, "{}", response.body);

    let payload = json(&response.body);
    let data = &payload["data"];
    assert_eq!(data["attributes"]["atk"], 904.0);
    assert_eq!(data["buffList"]["tachr_017_huang_1"]["blackboard"]["atk"], 0.53);
    assert_eq!(data["buffList"]["uniequip_002_huang"]["override_talent"], "1");
    assert_eq!(data["buffs"]["atk_scale"], 1.0);
    assert!(data["trace"].as_array().is_some_and(|trace| !trace.is_empty()));

    // Buffs stay in application order on the wire: module, talent, trait.
    let position = |key: &str| response.body.find(&format!("\"{key}\"")).expect("key present");
    assert!(position("uniequip_002_huang") < position("tachr_017_huang_1"));
    assert!(position("tachr_017_huang_1") < position("tachr_017_huang_trait"));
}

#[test]
fn attributes_endpoint_maps_errors_to_status_codes() {
    let state = state(Environment::Production);

    let missing = route_request(
        &state,
        "POST",
        "/api/attributes",
        r#"{"id":"nobody","phaseIndex":0,"level":1}"#,
    );
    assert_eq!(missing.status_code, 404);

    let bad_level = route_request(
        &state,
        "POST",
        "/api/attributes",
        r#"{"id":"Amiya","phaseIndex":0,"level":51}"#,
    );
    assert_eq!(bad_level.status_code, 400);
    assert!(json(&bad_level.body)["error"]
        .as_str()
        .is_some_and(|message| message.contains("51")));

    let malformed = route_request(&state, "POST", "/api/attributes", "{not json");
    assert_eq!(malformed.status_code, 400);
}

#[test]
fn curve_endpoint_projects_every_requested_operator() {
    let body = r#"{
        "operators": [
            {"operatorId":"Blaze","phaseIndex":2,"level":90,"favor":100},
            {"operatorId":"Amiya","label":"Amiya E2","phaseIndex":2,"level":80,"favor":100}
        ],
        "axis": {"kind":"defense","maxValue":400,"stepSize":200}
    }"#;
    let response = route_request(&state(Environment::Production), "POST", "/api/dps/curve", body);
    assert_eq!(response.status_code, 200, "{}", response.body);

    let points = json(&response.body)["data"].clone();
    let points = points.as_array().expect("data should be an array");
    assert_eq!(points.len(), 3);
    assert_eq!(points[2]["axisValue"], 400.0);
    let blaze = points[0]["Blaze"].as_f64().expect("Blaze series present");
    assert!((blaze - 685.0).abs() < 1e-9);
    assert!(points[0]["Amiya E2"].is_number());
}

#[test]
fn curve_endpoint_rejects_empty_and_invalid_requests() {
    let state = state(Environment::Production);

    let empty = route_request(&state, "POST", "/api/dps/curve", r#"{"operators":[]}"#);
    assert_eq!(empty.status_code, 400);

    let bad_axis = r#"{"operators":[{"id":"Blaze","phaseIndex":0,"level":1}],"axis":{"stepSize":0}}"#;
    let response = route_request(&state, "POST", "/api/dps/curve", bad_axis);
    assert_eq!(response.status_code, 400);
}

#[test]
fn curve_endpoint_rejects_oversized_axis_and_keeps_serving() {
    let state = state(Environment::Production);
    let oversized = r#"{"operators":[{"id":"Blaze","phaseIndex":2,"level":90}],
        "axis":{"kind":"defense","maxValue":1e300,"stepSize":1e-300}}"#;
    let response = route_request(&state, "POST", "/api/dps/curve", oversized);
    assert_eq!(response.status_code, 400);
    assert!(json(&response.body)["error"]
        .as_str()
        .is_some_and(|message| message.contains("more than")));

    let moderate = r#"{"operators":[{"id":"Blaze","phaseIndex":2,"level":90}],
        "axis":{"kind":"defense","maxValue":1e9,"stepSize":1}}"#;
    assert_eq!(route_request(&state, "POST", "/api/dps/curve", moderate).status_code, 400);

    let health = route_request(&state, "GET", "/api/health", "");
    assert_eq!(health.status_code, 200);
}

#[test]
fn curve_endpoint_needs_distinct_labels_for_repeated_operators() {
    let state = state(Environment::Production);
    let unlabeled = r#"{"operators":[
        {"id":"Blaze","phaseIndex":2,"level":90},
        {"id":"Blaze","phaseIndex":1,"level":1}]}"#;
    let response = route_request(&state, "POST", "/api/dps/curve", unlabeled);
    assert_eq!(response.status_code, 400);
    assert!(json(&response.body)["error"]
        .as_str()
        .is_some_and(|message| message.contains("'Blaze'")));

    let labeled = r#"{"operators":[
        {"id":"Blaze","label":"Blaze E2","phaseIndex":2,"level":90},
        {"id":"Blaze","label":"Blaze E1","phaseIndex":1,"level":1}]}"#;
    let response = route_request(&state, "POST", "/api/dps/curve", labeled);
    assert_eq!(response.status_code, 200);
    let payload = json(&response.body);
    let first = &payload["data"][0];
    assert!(first["Blaze E2"].is_number());
    assert!(first["Blaze E1"].is_number());
    assert!(first["Blaze E2"].as_f64() > first["Blaze E1"].as_f64());
}

#[test]
fn static_endpoint_serves_operators_modules_and_trust() {
    let state = state(Environment::Production);

    let operator = route_request(
        &state,
        "POST",
        "/api/static",
        r#"{"type":"operators","id":"char_002_amiya","fields":["name","rarity"]}"#,
    );
    assert_eq!(operator.status_code, 200);
    let record = json(&operator.body)["data"].clone();
    assert_eq!(record["name"], "Amiya");
    assert_eq!(record["rarity"], "TIER_5");
    assert!(record.get("phases").is_none());

    let modules =
        route_request(&state, "POST", "/api/static", r#"{"type":"modules","id":"Blaze"}"#);
    assert_eq!(modules.status_code, 200);
    assert_eq!(json(&modules.body)["data"][0]["uniEquipId"], "uniequip_002_huang");

    let trust = route_request(
        &state,
        "POST",
        "/api/static",
        r#"{"type":"trust","id":"Blaze","trust":50}"#,
    );
    assert_eq!(trust.status_code, 200);
    let trust = json(&trust.body);
    assert_eq!(trust["data"]["trust"], 50);
    assert_eq!(trust["data"]["bonus"]["atk"], 30.0);
}

#[test]
fn static_endpoint_rejects_unknown_types() {
    let state = state(Environment::Production);

    let unknown = route_request(&state, "POST", "/api/static", r#"{"type":"furniture"}"#);
    assert_eq!(unknown.status_code, 400);
    assert_eq!(json(&unknown.body)["error"], "Invalid type.");

    let unserved = route_request(&state, "POST", "/api/static", r#"{"type":"skins"}"#);
    assert_eq!(unserved.status_code, 501);

    let modules_without_id =
        route_request(&state, "POST", "/api/static", r#"{"type":"modules"}"#);
    assert_eq!(modules_without_id.status_code, 400);
}

#[test]
fn unknown_route_returns_not_found() {
    let response = route_request(&state(Environment::Development), "GET", "/api/nope", "");
    assert_eq!(response.status_code, 404);
    assert_eq!(json(&response.body)["error"], "Route not found");
}
