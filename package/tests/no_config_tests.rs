//! Tests for the single-repository environment over the on-disk fixtures

use assert_matches::assert_matches;
use pkgenv_package::environment::dispatch;
use pkgenv_package::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/testrepo")
}

fn env() -> NoConfigEnvironment {
    NoConfigEnvironment::new(repo_root()).unwrap()
}

fn pde(s: &str) -> PackageDatabaseEntry {
    PackageDatabaseEntry::parse(s).unwrap()
}

mod construction {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_path_string() {
        let root = repo_root();
        let env = NoConfigEnvironment::new(root.to_str().unwrap()).unwrap();
        assert_eq!(env.root(), root.as_path());
        assert_eq!(env.repository().unwrap().name(), "testrepo");
    }

    #[test]
    fn test_from_dir_entry() {
        let fixtures = repo_root().parent().unwrap().to_path_buf();
        let entry = std::fs::read_dir(&fixtures)
            .unwrap()
            .map(|e| e.unwrap())
            .find(|e| e.file_name() == "testrepo")
            .unwrap();

        let root = RepositoryRoot::try_from(&entry).unwrap();
        let env = NoConfigEnvironment::new(root).unwrap();
        assert_eq!(env.repository().unwrap().name(), "testrepo");
    }

    #[test]
    fn test_from_file_entry_is_type_error() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("plain"), "").unwrap();
        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        assert_matches!(RepositoryRoot::from_dir_entry(&entry), Err(Error::Type { .. }));
    }

    #[test]
    fn test_from_value() {
        let root = repo_root().display().to_string();
        assert!(NoConfigEnvironment::from_value(&json!(root)).is_ok());
        assert_matches!(NoConfigEnvironment::from_value(&json!(1)), Err(Error::Type { .. }));
        assert_matches!(NoConfigEnvironment::from_value(&json!([])), Err(Error::Type { .. }));
    }
}

mod queries {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_use() {
        let env = env();
        assert!(!env.query_use("foo", None).unwrap());
        assert!(!env.query_use("foo", Some(&pde("foo/bar-1.0::testrepo"))).unwrap());
    }

    #[test]
    fn test_accept_keyword() {
        let env = env();
        assert!(env.accept_keyword("test", None).unwrap());
        assert!(!env.accept_keyword("bad", None).unwrap());
        assert!(!env.accept_keyword("~test", None).unwrap());
        assert!(!env
            .accept_keyword("~test", Some(&pde("foo/bar-1.0::testrepo")))
            .unwrap());
    }

    #[test]
    fn test_accept_license() {
        let env = env();
        assert!(env.accept_license("test", None).unwrap());
        assert!(env.accept_license("anything", None).unwrap());
    }

    #[test]
    fn test_mask_reasons() {
        let env = env();
        assert!(env.mask_reasons(&pde("foo/bar-1.0::testrepo")).unwrap().is_empty());

        let reasons: Vec<MaskReason> = env
            .mask_reasons(&pde("foo/bar-2.0::testrepo"))
            .unwrap()
            .iter()
            .collect();
        assert_eq!(reasons, vec![MaskReason::Keyword]);

        // no user package.mask here, so slot 1 is only keyword masked
        let reasons: Vec<MaskReason> = env
            .mask_reasons(&pde("foo/baz-1.0::testrepo"))
            .unwrap()
            .iter()
            .collect();
        assert_eq!(reasons, vec![MaskReason::Keyword]);
        assert!(env.mask_reasons(&pde("foo/baz-2.0::testrepo")).unwrap().is_empty());

        assert_matches!(
            env.mask_reasons(&pde("foo/bar-1.0::nosuchrepo")),
            Err(Error::NoSuchRepository(_))
        );
    }

    #[test]
    fn test_package_sets() {
        let env = env();
        assert_matches!(env.package_set("everything"), Ok(DepTree::All(_)));
        assert_eq!(env.package_set("system").unwrap().leaves().len(), 1);
        assert_matches!(env.package_set("broken*"), Err(Error::SetName(_)));
        // no user configuration, so no world set
        assert_matches!(env.package_set("world"), Err(Error::SetName(_)));
    }

    #[test]
    fn test_fetch_repository() {
        let env = env();
        assert_eq!(
            env.package_database().fetch_repository("testrepo").unwrap().name(),
            "testrepo"
        );
    }
}

mod dynamic {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_call() {
        let env = env();
        assert_eq!(
            dispatch::call(&env, "accept_keyword", &[json!("~test"), json!("foo/bar-1.0::testrepo")])
                .unwrap(),
            json!(false)
        );
        assert_eq!(
            dispatch::call(&env, "mask_reasons", &[json!("foo/bar-2.0::testrepo")]).unwrap(),
            json!(["keyword"])
        );
        assert_eq!(
            dispatch::call(&env, "fetch_repository", &[json!("testrepo")]).unwrap()["name"],
            json!("testrepo")
        );
    }

    #[test]
    fn test_call_errors() {
        let env = env();
        assert_matches!(
            dispatch::call(&env, "query_use", &[json!("a"), json!("b"), json!("c")]),
            Err(Error::Argument { .. })
        );
        assert_matches!(
            dispatch::call(&env, "accept_license", &[json!(5)]),
            Err(Error::Type { .. })
        );
        assert_matches!(dispatch::call(&env, "new", &[]), Err(Error::NoMethod(_)));
    }
}
