//! Shell command run inside the de-identification container.
//!
//! The container works on fixed local names: the config is copied to
//! `deid.config`, the shard to `input.text`, and `deid.pl` writes
//! `input.res`, which is copied back next to the other outputs.

use crate::submitter::JobSettings;

pub const LOCAL_CONFIG: &str = "deid.config";
pub const LOCAL_INPUT: &str = "input.text";
pub const LOCAL_RESULT: &str = "input.res";
pub const LOCAL_DICT_DIR: &str = "dict";
pub const LOCAL_LISTS_DIR: &str = "lists";

/// Final path segment of an object location
pub fn base_name(location: &str) -> &str {
    location.rsplit('/').next().unwrap_or(location)
}

/// Builds the `&&`-chained command for one shard
pub fn build_command(input: &str, settings: &JobSettings) -> String {
    let mut steps = vec![format!("gsutil cp {} {LOCAL_CONFIG}", settings.config_file)];

    if let Some(dict) = settings.dict_directory.as_deref() {
        steps.push(copy_directory(dict, LOCAL_DICT_DIR));
    }
    if let Some(lists) = settings.lists_directory.as_deref() {
        steps.push(copy_directory(lists, LOCAL_LISTS_DIR));
    }

    steps.push(format!("gsutil cp {input} {LOCAL_INPUT}"));
    steps.push(format!("perl deid.pl input {LOCAL_CONFIG}"));
    steps.push(format!(
        "gsutil cp {LOCAL_RESULT} {}/{}",
        settings.output_directory.trim_end_matches('/'),
        base_name(input)
    ));

    steps.join(" && ")
}

fn copy_directory(remote: &str, local: &str) -> String {
    format!(
        "mkdir -p {local} && gsutil -m cp {}/* {local}/",
        remote.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JobSettings {
        JobSettings {
            output_directory: "outdir".to_string(),
            config_file: "test.config".to_string(),
            project_id: "my-project-id".to_string(),
            log_directory: "logdir".to_string(),
            dict_directory: None,
            lists_directory: None,
        }
    }

    #[test]
    fn test_command_without_optional_directories() {
        assert_eq!(
            build_command("infile", &settings()),
            "gsutil cp test.config deid.config && gsutil cp infile input.text && \
             perl deid.pl input deid.config && gsutil cp input.res outdir/infile"
        );
    }

    #[test]
    fn test_output_uses_input_base_name() {
        let mut settings = settings();
        settings.output_directory = "gs://output/".to_string();

        let cmd = build_command("gs://input/notes/file-01-of-02", &settings);
        assert!(cmd.starts_with("gsutil cp test.config deid.config && "));
        assert!(cmd.contains("gsutil cp gs://input/notes/file-01-of-02 input.text"));
        assert!(cmd.ends_with("gsutil cp input.res gs://output/file-01-of-02"));
    }

    #[test]
    fn test_dict_and_lists_directories_are_copied_before_run() {
        let mut settings = settings();
        settings.dict_directory = Some("gs://deid/dict/".to_string());
        settings.lists_directory = Some("gs://deid/lists".to_string());

        assert_eq!(
            build_command("infile", &settings),
            "gsutil cp test.config deid.config && \
             mkdir -p dict && gsutil -m cp gs://deid/dict/* dict/ && \
             mkdir -p lists && gsutil -m cp gs://deid/lists/* lists/ && \
             gsutil cp infile input.text && perl deid.pl input deid.config && \
             gsutil cp input.res outdir/infile"
        );
    }

    #[test]
    fn test_only_lists_directory() {
        let mut settings = settings();
        settings.lists_directory = Some("gs://deid/lists".to_string());

        let cmd = build_command("infile", &settings);
        assert!(cmd.contains("lists/"));
        assert!(!cmd.contains("dict"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("gs://b/dir/file"), "file");
        assert_eq!(base_name("infile"), "infile");
    }
}
