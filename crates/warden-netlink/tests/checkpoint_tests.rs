//! PortManager checkpoint and restore.

use warden_netlink::PortManager;
use warden_state::{load, new_object, save, AnyObject, Snapshot, TypeRegistry, Value};

fn registry() -> TypeRegistry {
    TypeRegistry::builder()
        .register::<PortManager>()
        .unwrap()
        .build()
}

#[test]
fn test_snapshot_layout() {
    let manager = new_object(PortManager::new());
    manager.lock().allocate(0, 7);

    let snapshot = save(&registry(), &[AnyObject::from_ref(&manager)]).unwrap();
    let record = &snapshot.records[0];

    assert_eq!(record.type_name, "pkg/sentry/socket/netlink/port.Manager");
    assert_eq!(record.field_names(), vec![String::from("ports")]);
    assert_eq!(
        record.fields[0].value,
        Value::Map(vec![(
            Value::Int(0),
            Value::Seq(vec![Value::Int(0), Value::Int(7)])
        )])
    );
}

#[test]
fn test_restore_keeps_allocations_and_counts() {
    let manager = new_object(PortManager::new());
    {
        let mut m = manager.lock();
        m.allocate(0, 0);
        m.allocate(0, 0);
        m.allocate(16, 100);
    }

    let snapshot = save(&registry(), &[AnyObject::from_ref(&manager)]).unwrap();
    let bytes = snapshot.to_json().unwrap();
    let restored = load(&registry(), &Snapshot::from_json(&bytes).unwrap()).unwrap();

    let manager = restored.root::<PortManager>(0).unwrap();
    let mut m = manager.lock();
    assert!(m.is_allocated(0, 1) && m.is_allocated(0, 2));
    assert!(m.is_allocated(16, 100));
    assert_eq!(m.in_use(0), 2);
    assert_eq!(m.in_use(16), 1);

    // The restored manager keeps allocating where the original left off.
    assert_eq!(m.allocate(0, 0), Some(3));
}
