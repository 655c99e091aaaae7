pub const DRIVE_TOKEN: &str = "{drive}";
pub const IMAGE_TOKEN: &str = "{imagePath}";

/// Replace every placeholder in `template`.
///
/// Inputs are validated against `{`/`}` beforehand, so a substituted value
/// can never introduce a new placeholder.
pub fn substitute(template: &str, drive: &str, image_path: &str) -> String {
    template
        .replace(DRIVE_TOKEN, drive)
        .replace(IMAGE_TOKEN, image_path)
}

pub fn render_args(template: &[&str], drive: &str, image_path: &str) -> Vec<String> {
    template
        .iter()
        .map(|arg| substitute(arg, drive, image_path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_suffix_is_appended() {
        assert_eq!(substitute("{drive}2", "/dev/sdb", "/x.sfs"), "/dev/sdb2");
    }

    #[test]
    fn every_occurrence_is_replaced() {
        assert_eq!(
            substitute("{drive}:{drive}:{imagePath}", "/dev/sdb", "/x.sfs"),
            "/dev/sdb:/dev/sdb:/x.sfs"
        );
    }

    #[test]
    fn args_without_tokens_pass_through() {
        let rendered = render_args(&["-p", "/mnt/boot/efi"], "/dev/sdb", "/x.sfs");
        assert_eq!(rendered, vec!["-p", "/mnt/boot/efi"]);
    }
}
