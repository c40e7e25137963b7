use std::collections::HashSet;

use labgear_store::{
    now_utc, Machine, MachineKind, MachineRepository, MachineSpec, RepositoryError,
    SqliteMachineRepository,
};

fn open_repo() -> SqliteMachineRepository {
    let repo = SqliteMachineRepository::open_in_memory().expect("repo");
    repo.ensure_schema().expect("schema");
    repo
}

fn machine(name: &str, kind: MachineKind) -> Machine {
    MachineSpec {
        name: name.to_string(),
        kind: kind.as_str().to_string(),
        make: "Dell".to_string(),
        model: "OptiPlex7050".to_string(),
        ..MachineSpec::default()
    }
    .into_machine(uuid::Uuid::new_v4().to_string(), now_utc())
    .expect("valid machine")
}

#[test]
fn sqlite_repository_roundtrip() {
    let repo = open_repo();
    let mut stored = machine("pve2", MachineKind::Proxmox);
    stored.cpu = "i7-7700".to_string();
    stored.ram_gb = 32;
    stored.storage_tb = 1.5;
    repo.create(&stored).expect("create");

    let loaded = repo.get_by_id(&stored.id).expect("get").expect("present");
    assert_eq!(loaded, stored);
}

#[test]
fn sqlite_repository_defaults_optional_fields() {
    let repo = open_repo();
    let stored = machine("nas01", MachineKind::Nas);
    repo.create(&stored).expect("create");

    let loaded = repo.get_by_id(&stored.id).expect("get").expect("present");
    assert_eq!(loaded.cpu, "");
    assert_eq!(loaded.ram_gb, 0);
    assert_eq!(loaded.storage_tb, 0.0);
    assert_eq!(loaded.notes, "");
}

#[test]
fn sqlite_repository_rejects_duplicate_id() {
    let repo = open_repo();
    let stored = machine("pve2", MachineKind::Proxmox);
    repo.create(&stored).expect("create");

    let err = repo.create(&stored).expect_err("duplicate");
    assert!(matches!(err, RepositoryError::Conflict(id) if id == stored.id));
}

#[test]
fn sqlite_repository_get_missing_is_none() {
    let repo = open_repo();
    assert!(repo.get_by_id("missing").expect("get").is_none());
}

#[test]
fn sqlite_repository_list_filters_by_kind() {
    let repo = open_repo();
    let a = machine("pve1", MachineKind::Proxmox);
    let b = machine("pve2", MachineKind::Proxmox);
    let c = machine("pi", MachineKind::Sbc);
    for item in [&a, &b, &c] {
        repo.create(item).expect("create");
    }

    let all: HashSet<String> = repo
        .list(None)
        .expect("list")
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(all, HashSet::from([a.id.clone(), b.id.clone(), c.id.clone()]));

    let proxmox: HashSet<String> = repo
        .list(Some(MachineKind::Proxmox))
        .expect("list")
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(proxmox, HashSet::from([a.id, b.id]));

    assert!(repo.list(Some(MachineKind::Laptop)).expect("list").is_empty());
}

#[test]
fn sqlite_repository_update_keeps_creation_time() {
    let repo = open_repo();
    let stored = machine("pve2", MachineKind::Proxmox);
    repo.create(&stored).expect("create");

    let mut changed = stored.clone();
    changed.name = "renamed".to_string();
    changed.kind = MachineKind::Nas;
    changed.created_at = stored.created_at + chrono::Duration::days(1);
    changed.updated_at = stored.updated_at + chrono::Duration::seconds(3);
    repo.update(&changed).expect("update");

    let loaded = repo.get_by_id(&stored.id).expect("get").expect("present");
    assert_eq!(loaded.name, "renamed");
    assert_eq!(loaded.kind, MachineKind::Nas);
    assert_eq!(loaded.created_at, stored.created_at);
    assert_eq!(loaded.updated_at, changed.updated_at);
}

#[test]
fn sqlite_repository_update_never_upserts() {
    let repo = open_repo();
    let ghost = machine("ghost", MachineKind::Laptop);
    let err = repo.update(&ghost).expect_err("missing");
    assert!(matches!(err, RepositoryError::NotFound(_)));
    assert!(repo.get_by_id(&ghost.id).expect("get").is_none());
}

#[test]
fn sqlite_repository_delete_then_get_is_none() {
    let repo = open_repo();
    let stored = machine("pve2", MachineKind::Proxmox);
    repo.create(&stored).expect("create");
    repo.delete(&stored.id).expect("delete");

    assert!(repo.get_by_id(&stored.id).expect("get").is_none());
    let err = repo.delete(&stored.id).expect_err("second delete");
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[test]
fn sqlite_repository_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lab_gear.db");
    let path = path.to_str().expect("utf-8 path");

    let stored = machine("pve2", MachineKind::Proxmox);
    {
        let repo = SqliteMachineRepository::open(path).expect("open");
        repo.ensure_schema().expect("schema");
        repo.create(&stored).expect("create");
    }

    let repo = SqliteMachineRepository::open(path).expect("reopen");
    repo.ensure_schema().expect("schema");
    repo.ping().expect("ping");
    let loaded = repo.get_by_id(&stored.id).expect("get").expect("present");
    assert_eq!(loaded, stored);
}
