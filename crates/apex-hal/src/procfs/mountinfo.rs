//! Parsing helpers for `/proc/self/mountinfo`.

use std::path::Path;

/// Mount points whose source is `dev_path` itself or one of its partitions.
pub fn mounted_under_device(mountinfo: &str, dev_path: &Path) -> Vec<String> {
    let prefix = dev_path.to_string_lossy().to_string();
    let mut mounts = Vec::new();

    for line in mountinfo.lines() {
        // mountinfo format:
        //   <pre fields...> <mount point> <...> - <fstype> <source> <superopts>
        let Some((mount_point, source)) = split_entry(line) else {
            continue;
        };
        if is_same_or_partition(&source, &prefix) {
            mounts.push(mount_point);
        }
    }

    mounts.sort();
    mounts.dedup();
    mounts
}

/// `/dev/sda` owns `/dev/sda1`; `/dev/nvme0n1` owns `/dev/nvme0n1p2`.
/// Neither owns a sibling disk such as `/dev/sdaa1` or `/dev/nvme0n10`.
fn is_same_or_partition(source: &str, disk: &str) -> bool {
    let Some(rest) = source.strip_prefix(disk) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    let digits = if disk.ends_with(|c: char| c.is_ascii_digit()) {
        match rest.strip_prefix('p') {
            Some(d) => d,
            None => return false,
        }
    } else {
        rest
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Source device of the `/` mount.
pub fn root_mount_source(mountinfo: &str) -> Option<String> {
    mountinfo
        .lines()
        .filter_map(split_entry)
        .find(|(mount_point, _)| mount_point == "/")
        .map(|(_, source)| source)
}

/// Whether anything is mounted exactly at `path`.
pub fn is_mount_point(mountinfo: &str, path: &Path) -> bool {
    let target = normalize(&path.to_string_lossy());
    mountinfo
        .lines()
        .filter_map(split_entry)
        .any(|(mount_point, _)| normalize(&mount_point) == target)
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let (pre, post) = line.split_once(" - ")?;
    let mount_point = pre.split_whitespace().nth(4)?;
    let source = post.split_whitespace().nth(1)?;
    Some((unescape_mount_path(mount_point), source.to_string()))
}

pub fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

fn normalize(path: &str) -> String {
    if path.len() > 1 && path.ends_with('/') {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    }
}
