//! Job argument resolution
//!
//! The job host passes arguments as `--NAME value` or `--NAME=value` pairs,
//! interleaved with its own options. [`JobArgs::resolve`] picks out the six
//! names the job needs and ignores everything else.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Bucket holding the input Parquet file
pub const INPUT_BUCKET: &str = "INPUT_BUCKET";
/// Bucket receiving the JSON output
pub const OUTPUT_BUCKET: &str = "OUTPUT_BUCKET";
/// Status table name
pub const JOBS_TABLE: &str = "JOBS_TABLE";
/// Region for every client
pub const REGION: &str = "REGION";
/// Key of the input object
pub const INPUT_S3_KEY: &str = "INPUT_S3_KEY";
/// Job identifier
pub const JOB_ID_ARG: &str = "JOB_ID_ARG";

/// Every required argument, in reporting order
pub const REQUIRED_ARGS: [&str; 6] = [
    INPUT_BUCKET,
    OUTPUT_BUCKET,
    JOBS_TABLE,
    REGION,
    INPUT_S3_KEY,
    JOB_ID_ARG,
];

/// File name of the output object under the job prefix
pub const OUTPUT_FILE_NAME: &str = "output.json";

/// Resolved invocation arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobArgs {
    /// Bucket holding the input Parquet file (`INPUT_BUCKET`)
    pub input_bucket: String,
    /// Bucket receiving the JSON output (`OUTPUT_BUCKET`)
    pub output_bucket: String,
    /// Status table name (`JOBS_TABLE`)
    pub jobs_table: String,
    /// AWS region for every client (`REGION`)
    pub region: String,
    /// Key of the input object (`INPUT_S3_KEY`)
    pub input_key: String,
    /// Job identifier and status item key (`JOB_ID_ARG`)
    pub job_id: String,
}

impl JobArgs {
    /// Resolve the job arguments from raw process arguments
    ///
    /// Unknown options are skipped. A name given more than once keeps its
    /// last value.
    pub fn resolve<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut found = collect_options(args, &REQUIRED_ARGS);

        let mut take = |name: &str| -> Result<String> {
            match found.remove(name) {
                None => Err(Error::missing_field(name)),
                Some(None) => Err(Error::invalid_value(name, "expected a value")),
                Some(Some(value)) if value.is_empty() => {
                    Err(Error::invalid_value(name, "value must not be empty"))
                }
                Some(Some(value)) => Ok(value),
            }
        };

        Ok(Self {
            input_bucket: take(INPUT_BUCKET)?,
            output_bucket: take(OUTPUT_BUCKET)?,
            jobs_table: take(JOBS_TABLE)?,
            region: take(REGION)?,
            input_key: take(INPUT_S3_KEY)?,
            job_id: take(JOB_ID_ARG)?,
        })
    }

    /// Key of the output object: `{job_id}/output.json`
    pub fn output_key(&self) -> String {
        format!("{}/{OUTPUT_FILE_NAME}", self.job_id)
    }
}

/// Scan `args` for `--NAME` options whose name is in `wanted`
///
/// `None` records an option that appeared without a value.
fn collect_options<S: AsRef<str>>(args: &[S], wanted: &[&str]) -> HashMap<String, Option<String>> {
    let mut found = HashMap::new();
    let mut iter = args.iter().map(AsRef::as_ref).peekable();

    while let Some(arg) = iter.next() {
        let Some(option) = arg.strip_prefix("--") else {
            continue;
        };

        if let Some((name, value)) = option.split_once('=') {
            if wanted.contains(&name) {
                found.insert(name.to_string(), Some(value.to_string()));
            }
            continue;
        }

        if !wanted.contains(&option) {
            continue;
        }

        let value = match iter.peek() {
            Some(next) if !next.starts_with("--") => iter.next().map(ToString::to_string),
            _ => None,
        };
        found.insert(option.to_string(), value);
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use test_case::test_case;

    fn full_args() -> Vec<String> {
        [
            "--INPUT_BUCKET",
            "in-bucket",
            "--OUTPUT_BUCKET",
            "out-bucket",
            "--JOBS_TABLE",
            "jobs",
            "--REGION",
            "us-east-1",
            "--INPUT_S3_KEY",
            "abc/data.parquet",
            "--JOB_ID_ARG",
            "abc",
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    #[test]
    fn test_resolve_all_args() {
        let args = JobArgs::resolve(&full_args()).unwrap();
        assert_eq!(args.input_bucket, "in-bucket");
        assert_eq!(args.output_bucket, "out-bucket");
        assert_eq!(args.jobs_table, "jobs");
        assert_eq!(args.region, "us-east-1");
        assert_eq!(args.input_key, "abc/data.parquet");
        assert_eq!(args.job_id, "abc");
        assert_eq!(args.output_key(), "abc/output.json");
    }

    #[test]
    fn test_resolve_ignores_host_options() {
        let mut args = vec![
            "script.py".to_string(),
            "--job-bookmark-option".to_string(),
            "job-bookmark-disable".to_string(),
            "--JOB_RUN_ID".to_string(),
            "jr_123".to_string(),
            "--enable-metrics".to_string(),
        ];
        args.extend(full_args());
        let resolved = JobArgs::resolve(&args).unwrap();
        assert_eq!(resolved.job_id, "abc");
    }

    #[test]
    fn test_resolve_equals_form() {
        let args = [
            "--INPUT_BUCKET=in",
            "--OUTPUT_BUCKET=out",
            "--JOBS_TABLE=jobs",
            "--REGION=eu-west-1",
            "--INPUT_S3_KEY=k=v/file.parquet",
            "--JOB_ID_ARG=j1",
        ];
        let resolved = JobArgs::resolve(&args).unwrap();
        assert_eq!(resolved.region, "eu-west-1");
        assert_eq!(resolved.input_key, "k=v/file.parquet");
    }

    #[test]
    fn test_resolve_last_value_wins() {
        let mut args = full_args();
        args.push("--JOB_ID_ARG".to_string());
        args.push("override".to_string());
        assert_eq!(JobArgs::resolve(&args).unwrap().job_id, "override");
    }

    #[test_case(INPUT_BUCKET ; "input bucket")]
    #[test_case(OUTPUT_BUCKET ; "output bucket")]
    #[test_case(JOBS_TABLE ; "jobs table")]
    #[test_case(REGION ; "region")]
    #[test_case(INPUT_S3_KEY ; "input key")]
    #[test_case(JOB_ID_ARG ; "job id")]
    fn test_resolve_missing_arg(name: &str) {
        let flag = format!("--{name}");
        let full = full_args();
        let mut args = Vec::new();
        let mut iter = full.into_iter();
        while let Some(arg) = iter.next() {
            if arg == flag {
                iter.next();
            } else {
                args.push(arg);
            }
        }

        let err = JobArgs::resolve(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == name));
    }

    #[test]
    fn test_resolve_flag_without_value() {
        let mut args = full_args();
        // drop the value of the trailing --JOB_ID_ARG
        args.pop();
        let err = JobArgs::resolve(&args).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == JOB_ID_ARG));
    }

    #[test]
    fn test_resolve_flag_followed_by_flag() {
        let args = [
            "--INPUT_BUCKET",
            "--OUTPUT_BUCKET",
            "out",
            "--JOBS_TABLE",
            "jobs",
            "--REGION",
            "r",
            "--INPUT_S3_KEY",
            "k",
            "--JOB_ID_ARG",
            "j",
        ];
        let err = JobArgs::resolve(&args).unwrap_err();
        assert!(
            matches!(err, Error::InvalidConfigValue { ref field, .. } if field == INPUT_BUCKET)
        );
    }

    #[test]
    fn test_resolve_empty_value() {
        let mut args = full_args();
        args.push("--JOB_ID_ARG=".to_string());
        let err = JobArgs::resolve(&args).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_resolve_nothing() {
        let args: [&str; 0] = [];
        let err = JobArgs::resolve(&args).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == INPUT_BUCKET));
    }
}
