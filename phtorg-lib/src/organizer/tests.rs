use std::{
    collections::HashSet,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, UNIX_EPOCH},
};

use tempfile::TempDir;

use crate::{
    fingerprint::Fingerprint,
    record::TimestampSource,
    resolve::{ExifDateTag, ExifReader, ExifTags},
    CancelFlag, Error, Organizer, OrganizerConfig, Plan,
};

// 2020-09-13 05:26:40 in Vancouver.
const MTIME: u64 = 1_600_000_000;

/// Gives every file the same EXIF block, except `broken*.jpg` which fail to decode.
struct FakeExif(ExifTags);

impl ExifReader for FakeExif {
    fn read(&self, path: &Path) -> Result<Option<ExifTags>, Error> {
        let name = path.file_name().unwrap().to_string_lossy();
        if name.starts_with("broken") {
            return Err(exif::Error::InvalidFormat("truncated").into());
        }
        Ok(Some(self.0.clone()))
    }
}

struct Tree {
    src: TempDir,
    dst: TempDir,
}

impl Tree {
    fn new() -> Self {
        Self {
            src: tempfile::tempdir().unwrap(),
            dst: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.src.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(MTIME))
            .unwrap();
        path
    }

    fn organizer(&self) -> Organizer {
        let exif =
            ExifTags::default().with_date(ExifDateTag::DateTimeOriginal, "2021:03:15 10:20:30");
        Organizer::new(OrganizerConfig::new(self.dst.path()).with_workers(3))
            .with_exif_reader(FakeExif(exif))
    }

    fn plan(&self) -> Plan {
        self.organizer()
            .plan(self.src.path(), &CancelFlag::default(), |_| ())
            .expect("should plan")
    }
}

fn fingerprint(path: &Path) -> String {
    Fingerprint::of_file(path).unwrap().to_string()
}

fn assert_partition(plan: &Plan) {
    let accepted: HashSet<_> = plan.rename_tasks.iter().map(|t| &t.source.path).collect();
    let skipped: HashSet<_> = plan.skipped_items.iter().map(|i| &i.source.path).collect();
    let noop: HashSet<_> = plan.already_organized.iter().collect();
    assert!(accepted.is_disjoint(&skipped));
    assert!(accepted.is_disjoint(&noop));
    assert!(skipped.is_disjoint(&noop));
    assert_eq!(accepted.len() + skipped.len() + noop.len(), plan.completed);
}

#[test]
fn image_destination_from_exif() {
    let tree = Tree::new();
    let photo = tree.file("IMG_1234.jpg", b"jpeg bytes");
    let plan = tree.plan();

    assert_eq!(plan.rename_tasks.len(), 1);
    let task = &plan.rename_tasks[0];
    assert_eq!(task.source.path, photo);
    assert_eq!(
        task.destination,
        tree.dst
            .path()
            .join("2021")
            .join(format!("IMG_20210315_102030_{}.jpg", fingerprint(&photo)))
    );
    assert_eq!(
        task.source.resolved.as_ref().unwrap().source(),
        TimestampSource::Exif
    );
}

#[test]
fn screenshots_use_modified_time() {
    let tree = Tree::new();
    let shot = tree.file("Screenshot 1.PNG", b"png bytes");
    let plan = tree.plan();

    assert_eq!(plan.rename_tasks.len(), 1);
    assert_eq!(
        plan.rename_tasks[0].destination,
        tree.dst
            .path()
            .join("2020")
            .join(format!("SCR_20200913_052640_{}.png", fingerprint(&shot)))
    );
}

#[test]
fn commit_then_replan_is_a_noop() {
    let tree = Tree::new();
    tree.file("a.jpg", b"a");
    tree.file("nested/b.png", b"b");
    let organizer = tree.organizer();
    let plan = tree.plan();
    assert_eq!(plan.rename_tasks.len(), 2);

    let mut reported = Vec::new();
    let renamed = organizer
        .commit(&plan, |p| reported.push(p.completed))
        .expect("should commit");
    assert_eq!(renamed, 2);
    assert_eq!(reported, vec![1, 2]);
    for task in &plan.rename_tasks {
        assert!(!task.source.path.exists());
        assert!(task.destination.is_file());
    }

    // Running over the organized tree finds everything already in place.
    let replan = organizer
        .plan(tree.dst.path(), &CancelFlag::default(), |_| ())
        .unwrap();
    assert!(replan.rename_tasks.is_empty());
    assert!(replan.skipped_items.is_empty());
    assert_eq!(replan.already_organized.len(), 2);
    assert_partition(&replan);
}

#[test]
fn existing_destination_is_skipped() {
    let tree = Tree::new();
    let photo = tree.file("IMG_1.jpg", b"photo");
    let destination = tree
        .dst
        .path()
        .join("2021")
        .join(format!("IMG_20210315_102030_{}.jpg", fingerprint(&photo)));
    fs::create_dir_all(destination.parent().unwrap()).unwrap();
    fs::write(&destination, b"someone else").unwrap();

    let plan = tree.plan();
    assert!(plan.rename_tasks.is_empty());
    assert_eq!(plan.skipped_items.len(), 1);
    assert_eq!(
        plan.skipped_items[0].reason,
        format!("Destination already exists: {}", destination.display())
    );
    assert!(plan.skipped_items[0].source.resolved.is_some());
}

#[test]
fn colliding_destinations_are_all_skipped() {
    let tree = Tree::new();
    let first = tree.file("a/copy.jpg", b"same bytes");
    let second = tree.file("b/copy.jpg", b"same bytes");
    tree.file("c/other.jpg", b"other bytes");

    let plan = tree.plan();
    assert_eq!(plan.rename_tasks.len(), 1);
    assert_eq!(plan.skipped_items.len(), 2);
    assert_eq!(plan.skipped_items[0].source.path, first);
    assert_eq!(plan.skipped_items[1].source.path, second);
    assert!(plan.skipped_items[0]
        .reason
        .ends_with(&format!("is also planned for {}", second.display())));
    assert!(plan.skipped_items[1]
        .reason
        .ends_with(&format!("is also planned for {}", first.display())));
    assert_partition(&plan);
}

#[test]
fn decode_failures_are_skipped_and_the_run_continues() {
    let tree = Tree::new();
    tree.file("broken.jpg", b"x");
    tree.file("fine.jpg", b"y");
    tree.file("shot.png", b"z");
    tree.file("notes.txt", b"ignored");

    let plan = tree.plan();
    assert_eq!(plan.total, 3);
    assert_eq!(plan.completed, 3);
    assert!(!plan.cancelled);
    assert_eq!(plan.rename_tasks.len(), 2);
    assert_eq!(plan.skipped_items.len(), 1);
    let skipped = &plan.skipped_items[0];
    assert!(skipped.source.path.ends_with("broken.jpg"));
    assert!(skipped.source.resolved.is_none());
    assert!(skipped.reason.starts_with("exif:"));
    assert_partition(&plan);

    let sorted: Vec<_> = plan.rename_tasks.iter().map(|t| t.sort_key()).collect();
    let mut expected = sorted.clone();
    expected.sort();
    assert_eq!(sorted, expected);
}

#[test]
fn progress_counts_up_to_total() {
    let tree = Tree::new();
    for i in 0..12 {
        tree.file(&format!("{i}.png"), format!("{i}").as_bytes());
    }
    let mut reported = Vec::new();
    let plan = tree
        .organizer()
        .plan(tree.src.path(), &CancelFlag::default(), |p| {
            reported.push((p.completed, p.total))
        })
        .unwrap();
    assert_eq!(reported, (1..=12).map(|i| (i, 12)).collect::<Vec<_>>());
    assert_eq!(plan.rename_tasks.len(), 12);
}

#[test]
fn cancelled_plan_is_partial_but_consistent() {
    let tree = Tree::new();
    for i in 0..5 {
        tree.file(&format!("{i}.png"), format!("{i}").as_bytes());
    }
    let cancel = CancelFlag::default();
    cancel.cancel();
    let plan = tree
        .organizer()
        .plan(tree.src.path(), &cancel, |_| ())
        .unwrap();
    assert!(plan.cancelled);
    assert_eq!(plan.total, 5);
    assert_eq!(plan.completed, 0);
    assert_partition(&plan);
}

#[test]
fn commit_refuses_to_overwrite() {
    let tree = Tree::new();
    tree.file("a.png", b"a");
    let organizer = tree.organizer();
    let plan = tree.plan();
    let destination = &plan.rename_tasks[0].destination;
    fs::create_dir_all(destination.parent().unwrap()).unwrap();
    fs::write(destination, b"appeared meanwhile").unwrap();

    let result = organizer.commit(&plan, |_| ());
    assert!(matches!(result, Err(Error::DestinationExists(_))));
    assert_eq!(fs::read(destination).unwrap(), b"appeared meanwhile");
}
