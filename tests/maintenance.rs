//! Backup/restore and export behavior over a real workspace directory.

use tempfile::TempDir;
use tracklite::format::csv;
use tracklite::{Config, IssueRepository, Maintenance, NewIssue};

fn workspace() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let config = Config::rooted_at(dir.path());
    (dir, config)
}

fn titles(repo: &IssueRepository) -> Vec<String> {
    let mut titles: Vec<String> = repo.get_all().into_iter().map(|i| i.title).collect();
    titles.sort();
    titles
}

#[test]
fn backup_then_mutate_then_restore_reproduces_the_record_set() {
    let (_dir, config) = workspace();
    let maintenance = Maintenance::new(config.clone());

    {
        let mut repo = IssueRepository::open(&config).unwrap();
        repo.create(NewIssue::new("alpha", "d"));
        repo.create(NewIssue::new("beta", "d"));
        // Connection closes here so the backup sees a checkpointed file.
    }

    let backup_path = maintenance.backup().unwrap();
    assert!(backup_path.exists());
    assert!(backup_path.starts_with(&config.backup_dir));
    let name = backup_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("issues_backup_") && name.ends_with(".db"));

    {
        let mut repo = IssueRepository::open(&config).unwrap();
        repo.create(NewIssue::new("gamma", "d"));
        let beta = repo.get_all().iter().find(|i| i.title == "beta").unwrap().id;
        assert!(repo.delete(beta));
    }

    assert!(maintenance.restore(&backup_path));

    let repo = IssueRepository::open(&config).unwrap();
    assert_eq!(titles(&repo), vec!["alpha".to_string(), "beta".to_string()]);
}

#[test]
fn each_backup_gets_its_own_timestamped_file() {
    let (_dir, config) = workspace();
    {
        let mut repo = IssueRepository::open(&config).unwrap();
        repo.create(NewIssue::new("only", "d"));
    }
    let maintenance = Maintenance::new(config.clone());
    let first = maintenance.backup().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let second = maintenance.backup().unwrap();
    assert_ne!(first, second);
    assert!(first.exists() && second.exists());
}

#[test]
fn dedup_export_counts_distinct_ids() {
    let (dir, config) = workspace();
    let mut repo = IssueRepository::open(&config).unwrap();
    repo.create(NewIssue::new("one", "d"));
    repo.create(NewIssue::new("two", "d"));

    // Caller-supplied duplicates must not produce duplicate rows.
    let mut issues = repo.get_all();
    let dupes = issues.clone();
    issues.extend(dupes);
    assert_eq!(issues.len(), 4);

    let out = dir.path().join("all_issues.csv");
    csv::write_unique(&out, &issues).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count() - 1, 2);
}

#[test]
fn full_export_roundtrips_through_maintenance() {
    let (dir, config) = workspace();
    let mut repo = IssueRepository::open(&config).unwrap();
    repo.create(NewIssue::new("plain", "text"));
    repo.create(NewIssue::new("tricky, title", "has \"quotes\""));

    let maintenance = Maintenance::new(config);
    let out = dir.path().join("export.csv");
    assert!(maintenance.export_csv(repo.store(), &out));

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("\"tricky, title\""));
    assert!(text.contains("\"has \"\"quotes\"\"\""));
}

#[test]
fn stats_reflect_a_populated_store() {
    let (_dir, config) = workspace();
    let mut repo = IssueRepository::open(&config).unwrap();
    for n in 0..3 {
        repo.create(NewIssue::new(format!("issue {n}"), "d"));
    }

    let maintenance = Maintenance::new(config);
    let stats = maintenance.stats(repo.store());
    assert_eq!(stats.total, 3);
    assert_eq!(stats.open, 3);
    assert_eq!(stats.closed, 0);
    assert!(stats.size_kb >= 0.0);
}
