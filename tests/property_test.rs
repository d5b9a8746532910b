//! Property-based tests over the keyspace and identifier-equality
//! invariants from the protocol's data model.

use proptest::prelude::*;
use shellsync::identifier_store::IdentifierTable;
use shellsync::keyspace::ShellCacheKey;

fn arb_tenant_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,15}"
}

proptest! {
    /// Distinct tenant names never collide on their release/reload keys.
    #[test]
    fn distinct_names_never_collide_on_tenant_keys(a in arb_tenant_name(), b in arb_tenant_name()) {
        prop_assume!(a != b);
        prop_assert_ne!(
            ShellCacheKey::TenantRelease(&a).as_key(),
            ShellCacheKey::TenantRelease(&b).as_key()
        );
        prop_assert_ne!(
            ShellCacheKey::TenantReload(&a).as_key(),
            ShellCacheKey::TenantReload(&b).as_key()
        );
    }

    /// A tenant's release key never collides with its own reload key, nor
    /// with either heartbeat key, for any name.
    #[test]
    fn tenant_key_families_never_collide(name in arb_tenant_name()) {
        let release = ShellCacheKey::TenantRelease(&name).as_key();
        let reload = ShellCacheKey::TenantReload(&name).as_key();
        let changed = ShellCacheKey::ShellChanged.as_key();
        let created = ShellCacheKey::ShellCreated.as_key();

        prop_assert_ne!(&release, &reload);
        prop_assert_ne!(&release, &changed);
        prop_assert_ne!(&release, &created);
        prop_assert_ne!(&reload, &changed);
        prop_assert_ne!(&reload, &created);
    }

    /// Publishing the same identifier twice is idempotent: the second
    /// write leaves the recorded identifier equal to what the first wrote,
    /// so a poller comparing by equality would reconcile at most once.
    #[test]
    fn publishing_same_identifier_twice_is_idempotent(
        name in arb_tenant_name(),
        id in "[0-9A-Z]{26}",
    ) {
        let table = IdentifierTable::new();
        let record = table.get_or_create(&name);

        let differs_first = record.read().release_id.as_deref() != Some(id.as_str());
        if differs_first {
            record.write().release_id = Some(id.clone());
        }
        let differs_second = record.read().release_id.as_deref() != Some(id.as_str());

        prop_assert!(differs_first || !differs_second);
        prop_assert!(!differs_second);
        prop_assert_eq!(record.read().release_id.as_deref(), Some(id.as_str()));
    }

    /// Recording two distinct identifiers in sequence always leaves the
    /// later one as the observed value, regardless of order of arrival
    /// within this process.
    #[test]
    fn last_write_wins_for_sequential_identifiers(
        name in arb_tenant_name(),
        first in "[0-9A-Z]{26}",
        second in "[0-9A-Z]{26}",
    ) {
        prop_assume!(first != second);
        let table = IdentifierTable::new();
        let record = table.get_or_create(&name);

        record.write().reload_id = Some(first);
        record.write().reload_id = Some(second.clone());

        prop_assert_eq!(record.read().reload_id.as_deref(), Some(second.as_str()));
    }
}
