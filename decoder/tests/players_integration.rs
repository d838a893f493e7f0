use std::cell::RefCell;
use std::rc::Rc;

use decoder::{
    DataChange, DecodeError, DecodeObserver, Decoder, DecoderConfig, DynamicIndex,
    ListenerPolicy, Operation, PatchBuilder, PatchStats, RefId, Value,
};
use schema::{ElementType, FieldIndex, FieldType, PrimitiveType, SchemaDescriptor, TypeRegistry};

const PLAYERS: RefId = RefId::new(1);
const SCORES: RefId = RefId::new(20);

type Log = Rc<RefCell<Vec<String>>>;

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            0,
            SchemaDescriptor::builder("State")
                .field(0, "players", FieldType::map_of(ElementType::Schema(1)))
                .field(1, "boss", FieldType::reference(1))
                .field(2, "round", FieldType::number())
                .field(3, "items", FieldType::array_of(ElementType::Primitive(PrimitiveType::String)))
                .field(4, "scores", FieldType::map_of(ElementType::Primitive(PrimitiveType::Number)))
                .build()
                .unwrap(),
        )
        .unwrap()
        .with(
            1,
            SchemaDescriptor::builder("Player")
                .field(0, "x", FieldType::number())
                .field(1, "y", FieldType::number())
                .field(2, "name", FieldType::string())
                .build()
                .unwrap(),
        )
        .unwrap()
        .with(
            2,
            SchemaDescriptor::builder("Hero")
                .field(0, "x", FieldType::number())
                .field(1, "y", FieldType::number())
                .field(2, "name", FieldType::string())
                .field(3, "power", FieldType::primitive(PrimitiveType::Int8))
                .build()
                .unwrap(),
        )
        .unwrap()
}

fn decoder() -> Decoder {
    Decoder::with_config(registry(), 0, DecoderConfig::default()).unwrap()
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn label(index: &DynamicIndex) -> String {
    match index {
        DynamicIndex::Index(pos) => pos.to_string(),
        DynamicIndex::Key(key) => key.clone(),
    }
}

fn create_players() -> Vec<u8> {
    PatchBuilder::new()
        .field(Operation::Add, 0)
        .ref_id(PLAYERS)
        .finish()
}

fn add_player(wire_index: u32, key: &str, id: u32, x: f64, y: f64) -> Vec<u8> {
    PatchBuilder::new()
        .switch_to(PLAYERS)
        .item(Operation::Add, wire_index)
        .key(key)
        .ref_id(RefId::new(id))
        .switch_to(RefId::new(id))
        .field(Operation::Add, 0)
        .number(x)
        .field(Operation::Add, 1)
        .number(y)
        .finish()
}

fn record_items(decoder: &mut Decoder, target: RefId, events: &Log) {
    let sink = Rc::clone(events);
    decoder
        .on_add(target, move |_, index, _| {
            sink.borrow_mut().push(format!("add {}", label(index)));
        })
        .unwrap();
    let sink = Rc::clone(events);
    decoder
        .on_item_change(target, move |_, index, _| {
            sink.borrow_mut().push(format!("change {}", label(index)));
        })
        .unwrap();
    let sink = Rc::clone(events);
    decoder
        .on_item_remove(target, move |value, index, _| {
            sink.borrow_mut().push(format!("remove {} {value:?}", label(index)));
        })
        .unwrap();
}

#[test]
fn player_add_change_remove_lifecycle() {
    let mut decoder = decoder();
    decoder.decode(&create_players()).unwrap();

    let events = log();
    record_items(&mut decoder, PLAYERS, &events);

    decoder.decode(&add_player(0, "a", 2, 0.0, 0.0)).unwrap();
    assert_eq!(*events.borrow(), ["add a"]);

    let changes: Rc<RefCell<Vec<DataChange>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    decoder
        .on_change(RefId::new(2), move |list, _| {
            sink.borrow_mut().extend_from_slice(list);
        })
        .unwrap();

    let move_x = PatchBuilder::new()
        .switch_to(RefId::new(2))
        .field(Operation::Replace, 0)
        .number(5.0)
        .finish();
    decoder.decode(&move_x).unwrap();

    {
        let changes = changes.borrow();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field.as_deref(), Some("x"));
        assert_eq!(changes[0].previous_value, Value::Float(0.0));
        assert_eq!(changes[0].value, Value::Float(5.0));
    }
    assert_eq!(*events.borrow(), ["add a"], "add should not fire again");

    let remove = PatchBuilder::new()
        .switch_to(PLAYERS)
        .item(Operation::Delete, 0)
        .finish();
    let stats = decoder.decode(&remove).unwrap();

    assert_eq!(events.borrow().last().map(String::as_str), Some("remove a Ref(RefId(2))"));
    assert!(decoder.schema(RefId::new(2)).is_none());
    assert_eq!(stats.collected, 1);
    assert!(decoder.collection(PLAYERS).unwrap().is_empty());
}

#[test]
fn reapplying_a_patch_changes_nothing() {
    let mut decoder = decoder();
    decoder.decode(&create_players()).unwrap();
    let patch = add_player(0, "a", 2, 3.0, 4.0);
    decoder.decode(&patch).unwrap();
    let before = decoder.snapshot();

    let events = log();
    record_items(&mut decoder, PLAYERS, &events);
    let stats = decoder.decode(&patch).unwrap();

    assert_eq!(stats.changes, 0);
    assert_eq!(stats.collected, 0);
    assert!(events.borrow().is_empty());
    assert_eq!(decoder.snapshot(), before);
}

#[test]
fn delete_and_add_on_map_key() {
    let mut decoder = decoder();
    decoder.decode(&create_players()).unwrap();
    decoder.decode(&add_player(0, "a", 2, 0.0, 0.0)).unwrap();

    let events = log();
    record_items(&mut decoder, PLAYERS, &events);
    let sink = Rc::clone(&events);
    decoder
        .on_remove(RefId::new(2), move |_| sink.borrow_mut().push("player removed".into()))
        .unwrap();
    let sink = Rc::clone(&events);
    decoder
        .on_change(RefId::new(2), move |list, _| {
            for change in list {
                sink.borrow_mut().push(format!(
                    "player {} = {:?}",
                    change.field.as_deref().unwrap_or_default(),
                    change.value
                ));
            }
        })
        .unwrap();

    let patch = PatchBuilder::new()
        .switch_to(PLAYERS)
        .item(Operation::DeleteAndAdd, 0)
        .key("a")
        .ref_id(RefId::new(3))
        .switch_to(RefId::new(3))
        .field(Operation::Add, 0)
        .number(7.0)
        .finish();
    let stats = decoder.decode(&patch).unwrap();

    assert_eq!(
        *events.borrow(),
        [
            "player removed",
            "remove a Ref(RefId(2))",
            "add a",
            "player x = Float(7.0)",
        ]
    );
    assert_eq!(stats.collected, 1);
    assert!(decoder.schema(RefId::new(2)).is_none());
    assert_eq!(
        decoder.collection(PLAYERS).unwrap().get_key("a"),
        Some(&Value::Ref(RefId::new(3)))
    );
    assert_eq!(decoder.schema(RefId::new(3)).unwrap().listener_count(), 2);
}

#[test]
fn replaced_reference_hands_listeners_to_replacement() {
    let mut decoder = decoder();
    let boss = PatchBuilder::new()
        .field(Operation::Add, 1)
        .ref_id(RefId::new(4))
        .switch_to(RefId::new(4))
        .field(Operation::Add, 0)
        .number(1.0)
        .finish();
    decoder.decode(&boss).unwrap();

    let removals = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&removals);
    decoder
        .on_remove(RefId::new(4), move |_| *counter.borrow_mut() += 1)
        .unwrap();
    let root_changes: Rc<RefCell<Vec<DataChange>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&root_changes);
    decoder
        .on_change(RefId::ROOT, move |list, _| sink.borrow_mut().extend_from_slice(list))
        .unwrap();

    let replace = PatchBuilder::new()
        .field(Operation::DeleteAndAdd, 1)
        .ref_id(RefId::new(5))
        .switch_to(RefId::new(5))
        .field(Operation::Add, 0)
        .number(2.0)
        .finish();
    decoder.decode(&replace).unwrap();

    assert_eq!(*removals.borrow(), 1, "old boss should be announced once");
    {
        let changes = root_changes.borrow();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].previous_value, Value::Ref(RefId::new(4)));
        assert_eq!(changes[0].value, Value::Ref(RefId::new(5)));
    }
    assert!(decoder.schema(RefId::new(4)).is_none());
    assert_eq!(decoder.schema(RefId::new(5)).unwrap().listener_count(), 1);

    let clear_boss = PatchBuilder::new().field(Operation::Delete, 1).finish();
    decoder.decode(&clear_boss).unwrap();
    assert_eq!(*removals.borrow(), 2, "listener should follow the replacement");
    assert_eq!(decoder.field(RefId::ROOT, "boss"), Some(&Value::Null));
    assert_eq!(decoder.tracker().len(), 1);
}

#[test]
fn added_reference_replaces_previous_instance() {
    let mut decoder = decoder();
    let boss = PatchBuilder::new()
        .field(Operation::Add, 1)
        .ref_id(RefId::new(4))
        .finish();
    decoder.decode(&boss).unwrap();

    let removals = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&removals);
    decoder
        .on_remove(RefId::new(4), move |_| *counter.borrow_mut() += 1)
        .unwrap();

    let replace = PatchBuilder::new()
        .field(Operation::Add, 1)
        .ref_id(RefId::new(5))
        .finish();
    let stats = decoder.decode(&replace).unwrap();

    assert_eq!(*removals.borrow(), 1, "old boss should be announced once");
    assert_eq!(stats.collected, 1);
    assert!(decoder.schema(RefId::new(4)).is_none());
    assert_eq!(decoder.field(RefId::ROOT, "boss"), Some(&Value::Ref(RefId::new(5))));

    let clear_boss = PatchBuilder::new().field(Operation::Delete, 1).finish();
    decoder.decode(&clear_boss).unwrap();
    assert_eq!(*removals.borrow(), 2, "listener should follow the replacement");
}

fn create_scores(values: &[(u32, &str, f64)]) -> Vec<u8> {
    let mut builder = PatchBuilder::new()
        .field(Operation::Add, 4)
        .ref_id(SCORES)
        .switch_to(SCORES);
    for &(wire_index, key, value) in values {
        builder = builder.item(Operation::Add, wire_index).key(key).number(value);
    }
    builder.finish()
}

#[test]
fn deleting_zero_valued_element_notifies_removal() {
    let mut decoder = decoder();
    decoder.decode(&create_scores(&[(0, "a", 0.0)])).unwrap();
    let events = log();
    record_items(&mut decoder, SCORES, &events);

    let delete = PatchBuilder::new()
        .switch_to(SCORES)
        .item(Operation::Delete, 0)
        .finish();
    decoder.decode(&delete).unwrap();

    assert_eq!(*events.borrow(), ["remove a Float(0.0)"]);
    assert!(decoder.collection(SCORES).unwrap().is_empty());
}

#[test]
fn delete_and_add_of_zero_valued_element() {
    let mut decoder = decoder();
    decoder.decode(&create_scores(&[(0, "a", 0.0)])).unwrap();
    let events = log();
    record_items(&mut decoder, SCORES, &events);

    let patch = PatchBuilder::new()
        .switch_to(SCORES)
        .item(Operation::DeleteAndAdd, 0)
        .key("a")
        .number(9.0)
        .item(Operation::DeleteAndAdd, 1)
        .key("b")
        .number(0.0)
        .finish();
    decoder.decode(&patch).unwrap();

    // "b" held nothing, so only its add is reported.
    assert_eq!(*events.borrow(), ["remove a Float(0.0)", "add a", "add b"]);
    let scores = decoder.collection(SCORES).unwrap();
    assert_eq!(scores.get_key("a"), Some(&Value::Float(9.0)));
    assert_eq!(scores.get_key("b"), Some(&Value::Float(0.0)));
}

#[test]
fn clear_reports_zero_valued_elements() {
    let mut decoder = decoder();
    decoder
        .decode(&create_scores(&[(0, "a", 0.0), (1, "b", 0.0)]))
        .unwrap();
    let events = log();
    record_items(&mut decoder, SCORES, &events);

    let clear = PatchBuilder::new().switch_to(SCORES).clear().finish();
    decoder.decode(&clear).unwrap();

    assert_eq!(
        *events.borrow(),
        ["remove a Float(0.0)", "remove b Float(0.0)"]
    );
}

#[test]
fn collection_replacement_reports_old_items() {
    let mut decoder = decoder();
    let items = PatchBuilder::new()
        .field(Operation::Add, 3)
        .ref_id(RefId::new(10))
        .switch_to(RefId::new(10))
        .item(Operation::Add, 0)
        .string("sword")
        .item(Operation::Add, 1)
        .string("shield")
        .finish();
    decoder.decode(&items).unwrap();

    let events = log();
    record_items(&mut decoder, RefId::new(10), &events);

    let replace = PatchBuilder::new()
        .field(Operation::Add, 3)
        .ref_id(RefId::new(11))
        .switch_to(RefId::new(11))
        .item(Operation::Add, 0)
        .string("bow")
        .finish();
    let stats = decoder.decode(&replace).unwrap();

    assert_eq!(
        *events.borrow(),
        [
            "remove 0 String(\"sword\")",
            "remove 1 String(\"shield\")",
            "add 0",
        ]
    );
    assert_eq!(stats.collected, 1);
    assert!(decoder.collection(RefId::new(10)).is_none());
    let bag = decoder.collection(RefId::new(11)).unwrap();
    assert_eq!(bag.listener_count(), 3);
    assert_eq!(bag.get_at(0), Some(&Value::from("bow")));
    assert_eq!(bag.len(), 1);
}

#[test]
fn clear_removes_every_element() {
    let mut decoder = decoder();
    decoder.decode(&create_players()).unwrap();
    decoder.decode(&add_player(0, "a", 2, 0.0, 0.0)).unwrap();
    decoder.decode(&add_player(1, "b", 3, 1.0, 1.0)).unwrap();

    let events = log();
    record_items(&mut decoder, PLAYERS, &events);

    let clear = PatchBuilder::new().switch_to(PLAYERS).clear().finish();
    let stats = decoder.decode(&clear).unwrap();

    assert_eq!(
        *events.borrow(),
        ["remove a Ref(RefId(2))", "remove b Ref(RefId(3))"]
    );
    assert_eq!(stats.collected, 2);
    assert!(decoder.collection(PLAYERS).unwrap().is_empty());
    assert_eq!(decoder.tracker().len(), 2);
}

#[test]
fn polymorphic_element_uses_discriminated_type() {
    let mut decoder = decoder();
    decoder.decode(&create_players()).unwrap();
    let hero = PatchBuilder::new()
        .switch_to(PLAYERS)
        .item(Operation::Add, 0)
        .key("h")
        .ref_id(RefId::new(2))
        .type_id(2)
        .switch_to(RefId::new(2))
        .field(Operation::Add, 3)
        .primitive(PrimitiveType::Int8, &Value::Int(-3))
        .finish();
    decoder.decode(&hero).unwrap();

    let instance = decoder.schema(RefId::new(2)).unwrap();
    assert_eq!(instance.type_name(), "Hero");
    assert_eq!(instance.get("power"), Some(&Value::Int(-3)));
}

#[derive(Clone, Default)]
struct Recorder {
    unknown: Rc<RefCell<Vec<(RefId, FieldIndex, usize)>>>,
    stats: Rc<RefCell<Vec<PatchStats>>>,
    collected: Rc<RefCell<Vec<RefId>>>,
    lists: Rc<RefCell<Vec<(RefId, usize)>>>,
}

impl DecodeObserver for Recorder {
    fn patch_decoded(&mut self, stats: &PatchStats) {
        self.stats.borrow_mut().push(stats.clone());
    }

    fn unknown_field(&mut self, ref_id: RefId, field_index: FieldIndex, skipped: usize) {
        self.unknown.borrow_mut().push((ref_id, field_index, skipped));
    }

    fn changes_recorded(&mut self, ref_id: RefId, changes: &[DataChange]) {
        self.lists.borrow_mut().push((ref_id, changes.len()));
    }

    fn collected(&mut self, ref_ids: &[RefId]) {
        self.collected.borrow_mut().extend_from_slice(ref_ids);
    }
}

#[test]
fn unknown_field_resyncs_at_next_structure() {
    let recorder = Recorder::default();
    let mut decoder = decoder().with_observer(recorder.clone());
    decoder.decode(&create_players()).unwrap();
    decoder.decode(&add_player(0, "a", 2, 0.0, 0.0)).unwrap();

    recorder.lists.borrow_mut().clear();
    let patch = PatchBuilder::new()
        .switch_to(RefId::new(2))
        .field(Operation::Add, 9)
        .number(99.0)
        .switch_to(RefId::ROOT)
        .field(Operation::Add, 2)
        .number(3.0)
        .finish();
    let stats = decoder.decode(&patch).unwrap();

    assert_eq!(decoder.field(RefId::ROOT, "round"), Some(&Value::Float(3.0)));
    assert_eq!(*recorder.unknown.borrow(), [(RefId::new(2), 9, 1)]);
    assert_eq!(stats.resyncs, 1);
    assert_eq!(stats.changes, 1);
    assert_eq!(stats.bytes, patch.len());
    assert_eq!(recorder.stats.borrow().len(), 3);
    assert_eq!(*recorder.lists.borrow(), [(RefId::ROOT, 1)]);
}

#[test]
fn resync_skips_switch_to_untracked_ref() {
    let recorder = Recorder::default();
    let mut decoder = decoder().with_observer(recorder.clone());
    decoder.decode(&create_players()).unwrap();
    decoder.decode(&add_player(0, "a", 2, 0.0, 0.0)).unwrap();

    let patch = PatchBuilder::new()
        .switch_to(RefId::new(2))
        .field(Operation::Add, 9)
        .switch_to(RefId::new(50))
        .switch_to(RefId::ROOT)
        .field(Operation::Add, 2)
        .number(3.0)
        .finish();
    let stats = decoder.decode(&patch).unwrap();

    assert_eq!(*recorder.unknown.borrow(), [(RefId::new(2), 9, 2)]);
    assert_eq!(stats.resyncs, 1);
    assert_eq!(decoder.field(RefId::ROOT, "round"), Some(&Value::Float(3.0)));
    assert!(decoder.tracker().get(RefId::new(50)).is_none());
}

#[test]
fn resync_without_known_switch_stops_at_end() {
    let recorder = Recorder::default();
    let mut decoder = decoder().with_observer(recorder.clone());
    decoder.decode(&create_players()).unwrap();
    decoder.decode(&add_player(0, "a", 2, 0.0, 0.0)).unwrap();

    let patch = PatchBuilder::new()
        .switch_to(RefId::new(2))
        .field(Operation::Add, 9)
        .number(99.0)
        .raw(&[0x01, 0xFF])
        .finish();
    let stats = decoder.decode(&patch).unwrap();

    assert_eq!(*recorder.unknown.borrow(), [(RefId::new(2), 9, 3)]);
    assert_eq!(stats.bytes, patch.len());
    assert_eq!(stats.changes, 0);
    assert_eq!(decoder.field(RefId::new(2), "x"), Some(&Value::Float(0.0)));
}

#[test]
fn observer_sees_collected_refs() {
    let recorder = Recorder::default();
    let mut decoder = decoder().with_observer(recorder.clone());
    decoder.decode(&create_players()).unwrap();
    decoder.decode(&add_player(0, "a", 2, 0.0, 0.0)).unwrap();

    let drop_players = PatchBuilder::new().field(Operation::Delete, 0).finish();
    decoder.decode(&drop_players).unwrap();

    assert_eq!(*recorder.collected.borrow(), [PLAYERS, RefId::new(2)]);
    assert_eq!(decoder.tracker().len(), 1);
}

#[test]
fn trigger_all_replays_current_state() {
    let mut decoder = decoder();
    decoder.decode(&create_players()).unwrap();
    decoder.decode(&add_player(0, "a", 2, 1.0, 2.0)).unwrap();

    let events = log();
    record_items(&mut decoder, PLAYERS, &events);
    let root_fields = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&root_fields);
    decoder
        .on_change(RefId::ROOT, move |list, _| {
            for change in list {
                assert_eq!(change.op, Operation::Add);
                sink.borrow_mut().push(change.field.clone().unwrap_or_default());
            }
        })
        .unwrap();

    decoder.trigger_all().unwrap();

    assert_eq!(*root_fields.borrow(), ["players", "boss", "round", "items", "scores"]);
    assert_eq!(*events.borrow(), ["add a"]);
}

#[test]
fn scope_registers_listeners_on_new_players() {
    let mut decoder = decoder();
    decoder.decode(&create_players()).unwrap();

    let moves = log();
    let sink = Rc::clone(&moves);
    decoder
        .on_add(PLAYERS, move |value, index, scope| {
            let Some(player) = value.as_ref_id() else {
                return;
            };
            let key = label(index);
            let sink = Rc::clone(&sink);
            scope
                .on_change(player, move |list, _| {
                    sink.borrow_mut().push(format!("{key}: {} changes", list.len()));
                })
                .unwrap();
        })
        .unwrap();

    decoder.decode(&add_player(0, "a", 2, 1.0, 2.0)).unwrap();
    assert_eq!(*moves.borrow(), ["a: 2 changes"]);

    let nudge = PatchBuilder::new()
        .switch_to(RefId::new(2))
        .field(Operation::Replace, 1)
        .number(3.0)
        .finish();
    decoder.decode(&nudge).unwrap();
    assert_eq!(*moves.borrow(), ["a: 2 changes", "a: 1 changes"]);
}

fn round_patch(round: f64) -> Vec<u8> {
    PatchBuilder::new()
        .field(Operation::Replace, 2)
        .number(round)
        .finish()
}

#[test]
fn panicking_listener_is_isolated() {
    let mut decoder = decoder();
    let calls = Rc::new(RefCell::new(0));
    decoder
        .on_change(RefId::ROOT, |_, _| panic!("listener bug"))
        .unwrap();
    let counter = Rc::clone(&calls);
    decoder
        .on_change(RefId::ROOT, move |_, _| *counter.borrow_mut() += 1)
        .unwrap();

    decoder.decode(&round_patch(1.0)).unwrap();
    decoder.decode(&round_patch(2.0)).unwrap();

    assert_eq!(*calls.borrow(), 2);
    assert_eq!(decoder.field(RefId::ROOT, "round"), Some(&Value::Float(2.0)));
    assert_eq!(decoder.root().unwrap().listener_count(), 2);
}

#[test]
fn panicking_listener_is_reported() {
    let config = DecoderConfig {
        listener_policy: ListenerPolicy::Report,
        ..DecoderConfig::default()
    };
    let mut decoder = Decoder::with_config(registry(), 0, config).unwrap();
    decoder
        .on_change(RefId::ROOT, |_, _| panic!("listener bug"))
        .unwrap();

    let err = decoder.decode(&round_patch(4.0)).unwrap_err();
    assert_eq!(err, DecodeError::ListenersFailed { failures: 1 });
    assert_eq!(decoder.field(RefId::ROOT, "round"), Some(&Value::Float(4.0)));
}

#[test]
fn fatal_error_skips_dispatch() {
    let mut decoder = decoder();
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    decoder
        .on_change(RefId::ROOT, move |_, _| *counter.borrow_mut() += 1)
        .unwrap();

    let patch = PatchBuilder::new()
        .field(Operation::Replace, 2)
        .number(1.0)
        .switch_to(RefId::new(40))
        .finish();
    let err = decoder.decode(&patch).unwrap_err();

    assert!(matches!(err, DecodeError::RefNotFound { ref_id, .. } if ref_id == RefId::new(40)));
    assert_eq!(*calls.borrow(), 0);
}
