use myrtle::data::{DataStore, NoSpecs, Operator, SpecsTable};
use myrtle::stats::{
    apply_potential, apply_potential_range, apply_trust, compute_attributes, AttributeKey,
    Attributes, BuffEntry, ChangeSource, OperatorConfig, StatsError,
};
use serde_json::json;

fn store() -> DataStore {
    DataStore::from_json_str(include_str!("../data/operators.json")).expect("sample data parses")
}

fn specs() -> SpecsTable {
    SpecsTable::from_yaml_str(include_str!("../data/specs.yaml")).expect("sample specs parse")
}

fn operator(value: serde_json::Value) -> Operator {
    serde_json::from_value(value).expect("operator fixture should deserialize")
}

fn linear_operator() -> Operator {
    operator(json!({
        "id": "char_900_test",
        "name": "Tester",
        "profession": "SNIPER",
        "phases": [{
            "maxLevel": 90,
            "attributesKeyFrames": [
                { "level": 1, "data": { "atk": 100, "baseAttackTime": 1.0 } },
                { "level": 90, "data": { "atk": 1000, "baseAttackTime": 1.6 } }
            ]
        }]
    }))
}

#[test]
fn mid_level_atk_interpolates_and_rounds() {
    let config = OperatorConfig {
        level: 46,
        ..OperatorConfig::default()
    };
    let report = compute_attributes(&linear_operator(), &config, 0, &NoSpecs)
        .expect("level 46 is in range");

    assert_eq!(report.attributes.get(AttributeKey::Atk), 555.0);
    let bat = report.attributes.get(AttributeKey::BaseAttackTime);
    assert!((bat - (1.0 + 45.0 / 89.0 * 0.6)).abs() < 1e-12);
    assert!(report.trace.is_empty());
}

#[test]
fn level_outside_phase_range_is_rejected() {
    let config = OperatorConfig {
        level: 91,
        ..OperatorConfig::default()
    };
    let err = compute_attributes(&linear_operator(), &config, 0, &NoSpecs)
        .expect_err("level 91 exceeds max level");
    assert_eq!(
        err,
        StatsError::LevelOutOfRange {
            level: 91,
            max_level: 90
        }
    );

    let err = compute_attributes(&linear_operator(), &OperatorConfig::default(), 3, &NoSpecs)
        .expect_err("phase 3 does not exist");
    assert!(matches!(err, StatsError::PhaseNotFound { phase_index: 3, .. }));
}

#[test]
fn full_trust_adds_the_top_favor_frame() {
    let store = store();
    let blaze = store.resolve("Blaze").expect("Blaze is in the sample data");
    let mut trace = Vec::new();
    let attributes = Attributes::new().with(AttributeKey::Atk, 100.0);

    let boosted = apply_trust(blaze, 200, attributes, &mut trace).expect("trust applies");
    assert_eq!(boosted.get(AttributeKey::Atk), 160.0);
    assert_eq!(boosted.get(AttributeKey::MaxHp), 300.0);
    assert!(trace
        .iter()
        .all(|change| change.source == ChangeSource::Trust { favor_level: 50 }));

    let half = apply_trust(blaze, 50, Attributes::new(), &mut Vec::new()).expect("trust applies");
    assert_eq!(half.get(AttributeKey::Atk), 30.0);
}

#[test]
fn max_trust_lands_exactly_on_the_last_favor_frame() {
    let trusted = operator(json!({
        "id": "char_904_trust",
        "name": "Trusted",
        "profession": "PIONEER",
        "favorKeyFrames": [
            { "level": 0, "data": { "atk": 0 } },
            { "level": 50, "data": { "atk": 50 } }
        ]
    }));
    let attributes = Attributes::new().with(AttributeKey::Atk, 300.0);
    let boosted = apply_trust(&trusted, 100, attributes, &mut Vec::new()).expect("trust applies");
    assert_eq!(boosted.get(AttributeKey::Atk), 350.0);
}

#[test]
fn tokens_get_no_trust_bonus() {
    let token = operator(json!({
        "id": "token_10001_test",
        "name": "Drone",
        "profession": "TOKEN",
        "favorKeyFrames": [
            { "level": 0, "data": { "atk": 0 } },
            { "level": 50, "data": { "atk": 90 } }
        ]
    }));
    let attributes = apply_trust(&token, 100, Attributes::new(), &mut Vec::new())
        .expect("tokens are skipped");
    assert_eq!(attributes, Attributes::new());
}

#[test]
fn potential_ranks_accumulate_in_order() {
    let potent = operator(json!({
        "id": "char_901_pot",
        "name": "Potent",
        "profession": "CASTER",
        "potentialRanks": [
            { "buff": { "attributes": { "attributeModifiers": [ { "attributeType": 1, "value": 15 } ] } } },
            { "buff": { "attributes": { "attributeModifiers": [ { "attributeType": "MAX_HP", "value": 100 } ] } } },
            { "buff": null },
            { "buff": { "attributes": { "attributeModifiers": [ { "attributeType": "4", "value": -1 } ] } } }
        ]
    }));
    let base = Attributes::new()
        .with(AttributeKey::Atk, 500.0)
        .with(AttributeKey::MaxHp, 1000.0)
        .with(AttributeKey::Cost, 20.0);

    let two = apply_potential(&potent, 2, base.clone(), &mut Vec::new()).expect("codes map");
    assert_eq!(two.get(AttributeKey::Atk), 515.0);
    assert_eq!(two.get(AttributeKey::MaxHp), 1100.0);
    assert_eq!(two.get(AttributeKey::Cost), 20.0);

    let mut trace = Vec::new();
    let all = apply_potential(&potent, 4, base.clone(), &mut trace).expect("codes map");
    let split = apply_potential_range(&potent, 0, 2, base, &mut Vec::new())
        .and_then(|partial| apply_potential_range(&potent, 2, 4, partial, &mut Vec::new()))
        .expect("codes map");
    assert_eq!(all, split);
    assert_eq!(all.get(AttributeKey::Cost), 19.0);
    assert_eq!(trace.last().map(|change| &change.source), Some(&ChangeSource::Potential { rank: 4 }));
}

#[test]
fn unknown_potential_type_fails_the_computation() {
    let broken = operator(json!({
        "id": "char_902_bad",
        "name": "Broken",
        "profession": "MEDIC",
        "phases": [{
            "maxLevel": 50,
            "attributesKeyFrames": [
                { "level": 1, "data": { "atk": 100 } },
                { "level": 50, "data": { "atk": 200 } }
            ]
        }],
        "potentialRanks": [
            { "buff": { "attributes": { "attributeModifiers": [ { "attributeType": 99, "value": 1 } ] } } }
        ]
    }));
    let config = OperatorConfig {
        level: 10,
        potential_rank: 1,
        ..OperatorConfig::default()
    };
    let err = compute_attributes(&broken, &config, 0, &NoSpecs).expect_err("code 99 is unmapped");
    assert_eq!(err, StatsError::UnknownAttributeType("99".to_string()));
}

#[test]
fn modules_are_ignored_below_elite_two_or_without_an_id() {
    let store = store();
    let blaze = store.resolve("char_017_huang").expect("Blaze is in the sample data");
    let plain = OperatorConfig {
        level: 80,
        ..OperatorConfig::default()
    };
    let baseline = compute_attributes(blaze, &plain, 1, &specs()).expect("E1 80 is valid");

    let equipped = OperatorConfig {
        equip_id: Some("uniequip_002_huang".to_string()),
        equip_level: 3,
        ..plain.clone()
    };
    let at_elite_one = compute_attributes(blaze, &equipped, 1, &specs()).expect("E1 80 is valid");
    assert_eq!(at_elite_one.attributes, baseline.attributes);
    assert!(!at_elite_one.buff_list.contains_key("uniequip_002_huang"));

    let blank_id = OperatorConfig {
        level: 90,
        equip_id: Some(String::new()),
        ..OperatorConfig::default()
    };
    let no_module = OperatorConfig {
        level: 90,
        ..OperatorConfig::default()
    };
    let blank = compute_attributes(blaze, &blank_id, 2, &specs()).expect("E2 90 is valid");
    let none = compute_attributes(blaze, &no_module, 2, &specs()).expect("E2 90 is valid");
    assert_eq!(blank.attributes, none.attributes);
}

#[test]
fn fully_built_operator_layers_every_bonus() {
    let store = store();
    let blaze = store.resolve("blaze").expect("name lookup ignores case");
    let config = OperatorConfig {
        level: 90,
        favor: 100,
        potential_rank: 5,
        equip_id: Some("uniequip_002_huang".to_string()),
        equip_level: 3,
        skill_id: None,
    };
    let report = compute_attributes(blaze, &config, 2, &specs()).expect("full build is valid");

    // 762 base + 60 trust + 27 potential + 55 module
    assert_eq!(report.attributes.get(AttributeKey::Atk), 904.0);
    assert_eq!(report.attributes.get(AttributeKey::MaxHp), 3670.0);
    assert_eq!(report.attributes.get(AttributeKey::Cost), 21.0);
    assert_eq!(report.attributes.get(AttributeKey::BaseAttackTime), 1.2);

    let keys: Vec<&str> = report.buff_list.keys().collect();
    assert_eq!(
        keys,
        vec!["uniequip_002_huang", "tachr_017_huang_1", "tachr_017_huang_trait"]
    );

    let talent = report.buff_list["tachr_017_huang_1"]
        .blackboard()
        .expect("talent entries carry a blackboard");
    assert_eq!(talent.get("atk"), Some(0.53));
    assert!(!talent.contains_key("hp_ratio"));

    let trait_board = report.buff_list["tachr_017_huang_trait"]
        .blackboard()
        .expect("trait entries carry a blackboard");
    assert_eq!(trait_board.get("atk_scale"), Some(1.05));

    match &report.buff_list["uniequip_002_huang"] {
        BuffEntry::Module(equip) => {
            assert_eq!(equip.override_talent.as_deref(), Some("1"));
            assert!(equip.override_trait);
            assert_eq!(equip.remove_keys, vec!["hp_ratio".to_string()]);
        }
        other => panic!("expected module entry, got {other:?}"),
    }
}

#[test]
fn level_one_module_attaches_no_override_metadata() {
    let store = store();
    let blaze = store.resolve("Blaze").expect("Blaze is in the sample data");
    let config = OperatorConfig {
        level: 90,
        equip_id: Some("uniequip_002_huang".to_string()),
        equip_level: 1,
        ..OperatorConfig::default()
    };
    let report = compute_attributes(blaze, &config, 2, &specs()).expect("E2 90 is valid");

    assert_eq!(report.attributes.get(AttributeKey::Atk), 797.0);
    let talent = report.buff_list["tachr_017_huang_1"]
        .blackboard()
        .expect("talent entries carry a blackboard");
    assert_eq!(talent.get("atk"), Some(0.4));
    assert_eq!(talent.get("hp_ratio"), Some(0.5));
}

#[test]
fn removed_keys_are_dropped_before_the_module_board_merges() {
    let operator = operator(json!({
        "id": "char_903_merge",
        "name": "Merger",
        "profession": "WARRIOR",
        "phases": [
            { "maxLevel": 50, "attributesKeyFrames": [
                { "level": 1, "data": { "atk": 100 } }, { "level": 50, "data": { "atk": 200 } } ] },
            { "maxLevel": 80, "attributesKeyFrames": [
                { "level": 1, "data": { "atk": 200 } }, { "level": 80, "data": { "atk": 300 } } ] },
            { "maxLevel": 90, "attributesKeyFrames": [
                { "level": 1, "data": { "atk": 300 } }, { "level": 90, "data": { "atk": 400 } } ] }
        ],
        "talents": [{ "candidates": [{
            "unlockCondition": { "phase": "PHASE_0", "level": 1 },
            "prefabKey": "1",
            "blackboard": [ { "key": "a", "value": 1 }, { "key": "b", "value": 2 } ]
        }] }],
        "modules": [{
            "uniEquipId": "uniequip_002_merge",
            "data": { "phases": [
                { "equipLevel": 1, "attributeBlackboard": [] },
                { "equipLevel": 2, "attributeBlackboard": [], "parts": [
                    { "addOrOverrideTalentDataBundle": { "candidates": [
                        { "prefabKey": "1", "blackboard": [ { "key": "b", "value": 5 }, { "key": "c", "value": 9 } ] }
                    ] } }
                ] }
            ] }
        }]
    }));
    let specs = SpecsTable::from_yaml_str(
        "uniequip_002_merge:\n  override_talent: 1\n  remove_keys: [a]\n",
    )
    .expect("yaml parses");
    let config = OperatorConfig {
        level: 10,
        equip_id: Some("uniequip_002_merge".to_string()),
        equip_level: 2,
        ..OperatorConfig::default()
    };

    let report = compute_attributes(&operator, &config, 2, &specs).expect("E2 10 is valid");
    let board = report.buff_list["tachr_903_merge_1"]
        .blackboard()
        .expect("talent entries carry a blackboard");
    assert_eq!(board.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    assert_eq!(board.get("b"), Some(5.0));
    assert_eq!(board.get("c"), Some(9.0));
}

#[test]
fn talents_below_their_unlock_phase_are_absent() {
    let store = store();
    let amiya = store.resolve("Amiya").expect("Amiya is in the sample data");
    let config = OperatorConfig {
        level: 30,
        ..OperatorConfig::default()
    };
    let report = compute_attributes(amiya, &config, 0, &NoSpecs).expect("E0 30 is valid");

    let keys: Vec<&str> = report.buff_list.keys().collect();
    assert_eq!(keys, vec!["tachr_002_amiya_trait"]);
}
