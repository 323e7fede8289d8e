//! End-to-end tests for the check, init and update commands
//!
//! Uses a temporary directory for every path and a mockito server standing in
//! for both the AUR and the mirror.

mod helper;

use mockito::{Matcher, Server};

use augur::commands::App;
use augur::config::ConfigError;
use augur::error::AugurError;
use augur::version::cache::ArchiveCache;
use augur::version::checker::{Drift, DriftEntry};

use helper::database::repository_database;
use helper::workspace::{create_test_paths, packages, write_config, write_file};

fn yes() -> bool {
    true
}

fn no() -> bool {
    false
}

#[tokio::test]
async fn check_reports_upgrades_for_shared_packages() {
    let mut server = Server::new_async().await;
    let (_temp_dir, paths) = create_test_paths();
    write_config(&paths, &server.url());
    ArchiveCache::new(paths.cache_file())
        .store(&packages(&[("a", "1.0-2"), ("b", "2.0-1"), ("c", "3.0-1")]))
        .unwrap();

    let mirror = server
        .mock("GET", "/winry-testing/winry-testing.db")
        .with_status(200)
        .with_body(repository_database(&["a-1.0-1", "b-2.0-1"]))
        .create_async()
        .await;

    let report = App::new(paths).check().await.unwrap();

    mirror.assert_async().await;
    assert_eq!(
        report.entries,
        vec![DriftEntry {
            name: "a".to_string(),
            mirror_version: "1.0-1".to_string(),
            archive_version: "1.0-2".to_string(),
            drift: Drift::Upgrade,
        }]
    );
}

#[tokio::test]
async fn check_honours_blacklist() {
    let mut server = Server::new_async().await;
    let (_temp_dir, paths) = create_test_paths();
    write_config(&paths, &server.url());
    write_file(&paths.local_blacklist(), r#"{"blacklist": ["a"]}"#);
    ArchiveCache::new(paths.cache_file())
        .store(&packages(&[("a", "1.0-2"), ("b", "2.0-1")]))
        .unwrap();

    let _mirror = server
        .mock("GET", "/winry-testing/winry-testing.db")
        .with_status(200)
        .with_body(repository_database(&["a-1.0-1", "b-2.0-1"]))
        .create_async()
        .await;

    let report = App::new(paths).check().await.unwrap();

    assert!(!report.has_drift());
    assert_eq!(report.excluded, 1);
}

#[tokio::test]
async fn check_without_cache_warns_and_skips_mirror() {
    let mut server = Server::new_async().await;
    let (_temp_dir, paths) = create_test_paths();
    write_config(&paths, &server.url());

    let mirror = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let report = App::new(paths).check().await.unwrap();

    mirror.assert_async().await;
    assert!(!report.has_drift());
}

#[tokio::test]
async fn check_fails_when_mirror_database_is_missing() {
    let mut server = Server::new_async().await;
    let (_temp_dir, paths) = create_test_paths();
    write_config(&paths, &server.url());
    ArchiveCache::new(paths.cache_file())
        .store(&packages(&[("a", "1.0-2")]))
        .unwrap();

    let _mirror = server
        .mock("GET", "/winry-testing/winry-testing.db")
        .with_status(404)
        .create_async()
        .await;

    let result = App::new(paths).check().await;

    assert!(matches!(result, Err(AugurError::Registry(_))));
}

#[tokio::test]
async fn check_without_configuration_is_fatal() {
    let (_temp_dir, paths) = create_test_paths();

    let result = App::new(paths).check().await;

    assert!(matches!(
        result,
        Err(AugurError::Config(ConfigError::Missing(_)))
    ));
}

#[tokio::test]
async fn init_imports_seed_and_asks_before_replacing() {
    let (temp_dir, paths) = create_test_paths();
    let seed = temp_dir.path().join("seed.json");
    write_file(&seed, r#"{"yay": "12.3.5-1"}"#);
    let app = App::new(paths.clone());

    app.init(Some(&seed), &no).await.unwrap();
    let cache = ArchiveCache::new(paths.cache_file());
    assert_eq!(cache.load().unwrap().get("yay"), Some("12.3.5-1"));

    write_file(&seed, r#"{"yay": "12.4.0-1"}"#);
    let declined = app.init(Some(&seed), &no).await;
    assert!(matches!(declined, Err(AugurError::Declined)));
    assert_eq!(cache.load().unwrap().get("yay"), Some("12.3.5-1"));

    app.init(Some(&seed), &yes).await.unwrap();
    assert_eq!(cache.load().unwrap().get("yay"), Some("12.4.0-1"));
}

#[tokio::test]
async fn update_scrapes_the_aur_into_the_cache() {
    let mut server = Server::new_async().await;
    let (_temp_dir, paths) = create_test_paths();
    write_config(&paths, &server.url());

    let listing = server
        .mock("GET", "/packages/")
        .match_query(Matcher::UrlEncoded("O".into(), "0".into()))
        .with_status(200)
        .with_body(
            "<div class=\"pkglist-stats\"><p>2 packages found. Page 1 of 1.</p></div>\
             <table class=\"results\"><tbody>\
             <tr><td><a href=\"/packages/aura\">aura</a></td><td>3.2.9-1</td></tr>\
             <tr><td><a href=\"/packages/yay\">yay</a></td><td>12.3.5-1</td></tr>\
             </tbody></table>",
        )
        .expect(1)
        .create_async()
        .await;

    App::new(paths.clone()).update(&no).await.unwrap();

    listing.assert_async().await;
    let cached = ArchiveCache::new(paths.cache_file()).load().unwrap();
    assert_eq!(cached, packages(&[("aura", "3.2.9-1"), ("yay", "12.3.5-1")]));
}
