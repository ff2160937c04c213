//! Container shape tests for sheetsync.
//!
//! Covers expand fields holding lists of references, maps of records, maps
//! of references, int-keyed maps and prefix overrides, in both directions.
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown
)]

use sheetsync::config::SyncConfig;
use sheetsync::io::{ExportService, ImportService};
use sheetsync::mapping::Row;
use sheetsync::{MapValue, MemoryStore, Object, ObjectId, ObjectStore, Record, SchemaRegistry, Value};

const SCHEMA: &str = r#"
[[types]]
name = "Member"
exportable = true

[[types.fields]]
name = "name"
kind = { scalar = "text" }

[[types]]
name = "Stat"
kind = "struct"

[[types.fields]]
name = "v"
kind = { scalar = "int" }

[[types]]
name = "Guild"
exportable = true

[[types.fields]]
name = "title"
kind = { scalar = "text" }

[[types.fields]]
name = "party"
kind = { list = { reference = { class = "Member" } } }
expand = true

[[types.fields]]
name = "ranks"
kind = { map = { key = "int", value = { record = "Stat" } } }
expand = true

[[types.fields]]
name = "leaders"
kind = { map = { key = "text", value = { reference = { class = "Member" } } } }
expand = true

[[types.fields]]
name = "gear"
kind = { record = "Stat" }
expand = true
prefix = "g_"
"#;

const GUILD: &str = "/Game/Guilds/Red.Red";
const ANN: &str = "/Game/Members/Ann.Ann";
const BO: &str = "/Game/Members/Bo.Bo";
const CY: &str = "/Game/Members/Cy.Cy";

fn registry() -> SchemaRegistry {
    SchemaRegistry::from_toml_str(SCHEMA).unwrap()
}

fn member(id: &str, name: &str) -> Object {
    Object::new(
        ObjectId::new(id),
        Record::new("Member").with("name", Value::Text(name.to_string())),
    )
}

fn stat(v: i64) -> Value {
    Value::Record(Record::new("Stat").with("v", Value::Int(v)))
}

fn reference(id: Option<&str>) -> Value {
    Value::Reference(id.map(ObjectId::new))
}

fn party() -> Value {
    Value::List(vec![reference(Some(ANN)), reference(None), reference(Some(BO))])
}

/// Red guild: party [Ann, null, Bo], rank 3, leader chief Cy, gear 5.
fn store() -> MemoryStore {
    let mut ranks = MapValue::new();
    ranks.insert(Value::Int(3), stat(7));
    let mut leaders = MapValue::new();
    leaders.insert(Value::Text("chief".to_string()), reference(Some(CY)));

    let guild = Record::new("Guild")
        .with("title", Value::Text("Red".to_string()))
        .with("party", party())
        .with("ranks", Value::Map(ranks))
        .with("leaders", Value::Map(leaders))
        .with("gear", stat(5));

    MemoryStore::new()
        .with_object(Object::new(ObjectId::new(GUILD), guild))
        .with_object(member(ANN, "Ann"))
        .with_object(member(BO, "Bo"))
        .with_object(member(CY, "Cy"))
}

fn field(store: &MemoryStore, id: &str, name: &str) -> Value {
    store
        .object(&ObjectId::new(id))
        .and_then(|object| object.record.get(name))
        .cloned()
        .unwrap()
}

fn import(store: &mut MemoryStore, registry: &SchemaRegistry, row: &Row) -> (usize, usize) {
    let config = SyncConfig::default().with_save_on_import(false);
    let report = ImportService::new(registry, store, &config)
        .import_row(row, &ObjectId::new(GUILD))
        .unwrap();
    (report.applied, report.skipped_unknown)
}

#[test]
fn test_export_container_shapes() {
    let registry = registry();
    let store = store();
    let (columns, issues) = ExportService::new(&registry, &store)
        .export_columns(&ObjectId::new(GUILD))
        .unwrap();

    assert!(issues.is_empty());
    assert_eq!(
        columns.names(),
        [
            "title",
            "party_0_name",
            "party_2_name",
            "ranks_3_v",
            "leaders_chief_name",
            "g_v"
        ]
    );
    assert_eq!(columns.get("party_2_name"), Some("Bo"));
    assert_eq!(columns.get("ranks_3_v"), Some("7"));
    assert_eq!(columns.get("leaders_chief_name"), Some("Cy"));
}

#[test]
fn test_import_container_shapes() {
    let registry = registry();
    let mut store = store();
    let row = Row::from_pairs(
        [
            "party_0_name",
            "party_2_name",
            "ranks_3_v",
            "ranks_10_v",
            "leaders_chief_name",
            "g_v",
        ],
        ["Anna", "Bob", "8", "1", "Cyd", "6"],
    );

    let (applied, skipped) = import(&mut store, &registry, &row);
    assert_eq!(applied, 6);
    assert_eq!(skipped, 0);

    assert_eq!(field(&store, GUILD, "party"), party());
    assert_eq!(field(&store, ANN, "name"), Value::Text("Anna".to_string()));
    assert_eq!(field(&store, BO, "name"), Value::Text("Bob".to_string()));
    assert_eq!(field(&store, CY, "name"), Value::Text("Cyd".to_string()));

    let Value::Map(ranks) = field(&store, GUILD, "ranks") else {
        panic!("ranks is not a map");
    };
    assert_eq!(ranks.len(), 2);
    assert_eq!(ranks.get(&Value::Int(3)), Some(&stat(8)));
    assert_eq!(ranks.get(&Value::Int(10)), Some(&stat(1)));

    assert_eq!(field(&store, GUILD, "gear"), stat(6));
}

#[test]
fn test_prefix_override_on_import() {
    let registry = registry();
    let mut store = store();
    let row = Row::from_pairs(["gear_v", "g_v"], ["9", "2"]);

    let (applied, skipped) = import(&mut store, &registry, &row);
    assert_eq!(applied, 1);
    assert_eq!(skipped, 1);
    assert_eq!(field(&store, GUILD, "gear"), stat(2));
}

#[test]
fn test_null_reference_slots_are_not_filled() {
    let registry = registry();
    let mut store = store();
    let objects = store.len();
    let row = Row::from_pairs(
        ["party_1_name", "leaders_boss_name"],
        ["Ghost", "Nobody"],
    );

    let (applied, skipped) = import(&mut store, &registry, &row);
    assert_eq!(applied, 0);
    assert_eq!(skipped, 2);
    assert_eq!(store.len(), objects);
    assert_eq!(field(&store, GUILD, "party"), party());

    // The new key is inserted with a null reference and nothing behind it.
    let Value::Map(leaders) = field(&store, GUILD, "leaders") else {
        panic!("leaders is not a map");
    };
    assert_eq!(leaders.get(&Value::Text("boss".to_string())), Some(&reference(None)));
    assert_eq!(
        leaders.get(&Value::Text("chief".to_string())),
        Some(&reference(Some(CY)))
    );
}

#[test]
fn test_reference_list_grows_with_null_slots() {
    let registry = registry();
    let mut store = store();
    store.insert(Object::new(
        ObjectId::new(GUILD),
        Record::new("Guild").with("party", Value::List(Vec::new())),
    ));
    let objects = store.len();
    let row = Row::from_pairs(["party_0_name", "party_1_name"], ["Zed", "Yan"]);

    let (applied, skipped) = import(&mut store, &registry, &row);
    assert_eq!(applied, 0);
    assert_eq!(skipped, 2);
    assert_eq!(store.len(), objects);
    assert_eq!(
        field(&store, GUILD, "party"),
        Value::List(vec![reference(None), reference(None)])
    );
}
