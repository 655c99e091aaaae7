/// Partition path helper for block devices. Handles nvme/mmcblk postfixing.
pub fn partition_path(disk: &str, num: u32) -> String {
    if disk.contains("nvme") || disk.contains("mmcblk") || disk.contains("loop") {
        format!("{}p{}", disk, num)
    } else {
        format!("{}{}", disk, num)
    }
}

/// True when partition `num` of `disk` is addressed by plain suffixing
/// (`/dev/sda` -> `/dev/sda1`).
pub fn uses_plain_suffix(disk: &str) -> bool {
    partition_path(disk, 1) == format!("{}1", disk)
}
