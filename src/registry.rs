use crate::store::{Error, Result, Store};
use crate::version::VersionNumber;

/// One registered revision of a logical table: the lowest running version it
/// applies to, and a constructor for its concrete implementation.
pub struct Revision<T: ?Sized> {
    pub min_version: VersionNumber,
    pub build: fn(Store) -> Box<T>,
}

/// Picks the revision with the highest threshold not exceeding `running` and
/// instantiates it. Resolution is pure: the same (table, version) pair always
/// selects the same revision, regardless of registration order.
pub fn resolve<T: ?Sized>(
    table: &'static str,
    running: VersionNumber,
    revisions: &[Revision<T>],
    store: &Store,
) -> Result<Box<T>> {
    let picked = revisions
        .iter()
        .filter(|rev| rev.min_version <= running)
        .max_by_key(|rev| rev.min_version)
        .ok_or(Error::NoImplementationFound {
            table,
            version: running,
        })?;
    Ok((picked.build)(store.clone()))
}

#[cfg(test)]
mod tests {
    use super::{Revision, resolve};
    use crate::store::{Error, Store};
    use crate::version::VersionNumber;

    trait Named: std::fmt::Debug {
        fn name(&self) -> &'static str;
    }

    #[derive(Debug)]
    struct Old;
    #[derive(Debug)]
    struct New;

    impl Named for Old {
        fn name(&self) -> &'static str {
            "old"
        }
    }

    impl Named for New {
        fn name(&self) -> &'static str {
            "new"
        }
    }

    fn revisions() -> Vec<Revision<dyn Named>> {
        vec![
            Revision {
                min_version: VersionNumber::new(0, 3, 0),
                build: |_| Box::new(Old),
            },
            Revision {
                min_version: VersionNumber::new(0, 8, 0),
                build: |_| Box::new(New),
            },
        ]
    }

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("tmpdir");
        let store = Store::open(&dir.path().join("test.db")).expect("open store");
        (dir, store)
    }

    #[test]
    fn picks_highest_threshold_at_or_below_running() {
        let (_dir, store) = store();
        let table = resolve("things", VersionNumber::new(0, 9, 1), &revisions(), &store)
            .expect("resolvable");
        assert_eq!(table.name(), "new");
    }

    #[test]
    fn older_running_version_gets_older_revision() {
        let (_dir, store) = store();
        let table = resolve("things", VersionNumber::new(0, 5, 0), &revisions(), &store)
            .expect("resolvable");
        assert_eq!(table.name(), "old");

        // Threshold is inclusive.
        let table = resolve("things", VersionNumber::new(0, 8, 0), &revisions(), &store)
            .expect("resolvable");
        assert_eq!(table.name(), "new");
    }

    #[test]
    fn fails_when_nothing_is_old_enough() {
        let (_dir, store) = store();
        let err = resolve("things", VersionNumber::new(0, 1, 0), &revisions(), &store)
            .expect_err("no revision applies");
        assert!(matches!(
            err,
            Error::NoImplementationFound { table: "things", .. }
        ));
    }
}
