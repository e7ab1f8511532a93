use clap::{Parser, ValueEnum};
use log::debug;
use s3_presign_put::{
    basic::DEFAULT_REGION, execute, init_logger, AmbientCredentials, CredentialResolver, Error,
    Operation, Outcome, SignerParams,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    /// Print a presigned PUT url
    Url,
    /// PUT a file to an already presigned url
    Upload,
    /// Presign, then upload
    All,
}

/// An empty `--op` selects presign-then-upload, like leaving it out.
fn parse_op(value: &str) -> Result<Op, String> {
    if value.is_empty() {
        return Ok(Op::All);
    }
    Op::from_str(value, false)
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "All long flags take two dashes: --op, --bucket, --key."
)]
struct Args {
    /// url, upload or all; empty means all
    #[arg(long, value_parser = parse_op, default_value = "all")]
    op: Op,
    #[arg(long, default_value_t = String::new())]
    bucket: String,
    #[arg(long, default_value_t = String::new())]
    key: String,
    /// Presigned url, upload only
    #[arg(long)]
    url: Option<String>,
    /// Local file to upload, defaults to the key
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    path_style: bool,
    /// Print the url as json with its expiry
    #[arg(long)]
    json: bool,
    #[arg(long)]
    log_path: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn signer_params(&self) -> SignerParams {
        SignerParams {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            path_style: self.path_style,
        }
    }

    fn operation(&self) -> Result<Operation, Error> {
        match self.op {
            Op::Url => Ok(Operation::GenerateUrl {
                params: self.signer_params(),
            }),
            Op::Upload => {
                let url = self
                    .url
                    .clone()
                    .filter(|url| !url.is_empty())
                    .ok_or(Error::MissingArgument("url"))?;
                let file = self.file.clone().ok_or(Error::MissingArgument("file"))?;
                Ok(Operation::Upload { url, file })
            }
            Op::All => {
                let file = self
                    .file
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(&self.key));
                Ok(Operation::GenerateAndUpload {
                    params: self.signer_params(),
                    file,
                })
            }
        }
    }
}

async fn run(
    args: &Args,
    resolver: &dyn CredentialResolver,
    out: &mut impl Write,
) -> Result<(), Error> {
    let operation = args.operation()?;
    debug!("running {:?}", operation);
    let client = reqwest::Client::new();
    match execute(operation, resolver, &client).await? {
        Outcome::Presigned(presigned) if args.json => {
            writeln!(out, "{}", serde_json::to_string(&presigned)?)?;
        }
        Outcome::Presigned(presigned) => writeln!(out, "{}", presigned.url)?,
        Outcome::Uploaded(response) => writeln!(out, "{}", response.body)?,
    }
    Ok(())
}

/// Prints the error text, if any, and maps the result to the process exit status.
fn exit_status(result: Result<(), Error>, out: &mut impl Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            debug!("failed: {:?}", err);
            let _ = writeln!(out, "{}", err);
            1
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _logger = match init_logger(args.log_path.as_deref(), args.verbose) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("{}", err);
            None
        }
    };
    let mut stdout = std::io::stdout();
    let result = run(&args, &AmbientCredentials, &mut stdout).await;
    ExitCode::from(exit_status(result, &mut stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, Router};
    use s3_presign_put::{PresignedUrl, StaticCredentials};
    use std::sync::{Arc, Mutex};

    fn credentials() -> StaticCredentials {
        StaticCredentials::new("AKID".to_string(), "SECRET".to_string(), None)
    }

    async fn reply_with(State(hits): State<Arc<Mutex<u32>>>) -> (StatusCode, &'static str) {
        *hits.lock().unwrap() += 1;
        (StatusCode::FORBIDDEN, "<Error><Code>AccessDenied</Code></Error>")
    }

    /// Storage endpoint that denies every request and counts them.
    async fn spawn_denying_storage() -> (String, Arc<Mutex<u32>>) {
        let hits = Arc::new(Mutex::new(0));
        let app = Router::new().fallback(reply_with).with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    async fn invoke(argv: &[&str]) -> (u8, String) {
        let args = Args::parse_from(argv.iter().copied());
        let mut out = Vec::new();
        let result = run(&args, &credentials(), &mut out).await;
        let status = exit_status(result, &mut out);
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_default_op_uploads_key_as_file() {
        let args = Args::parse_from(["s3-presign-put", "--bucket", "b", "--key", "notes.txt"]);
        assert_eq!(args.op, Op::All);
        match args.operation().unwrap() {
            Operation::GenerateAndUpload { params, file } => {
                assert_eq!(params.bucket, "b");
                assert_eq!(params.key, "notes.txt");
                assert_eq!(file, PathBuf::from("notes.txt"));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_empty_op_is_presign_and_upload() {
        let args =
            Args::try_parse_from(["s3-presign-put", "--op", "", "--bucket", "b", "--key", "k"])
                .unwrap();
        assert_eq!(args.op, Op::All);
        assert!(matches!(
            args.operation().unwrap(),
            Operation::GenerateAndUpload { .. }
        ));
    }

    #[test]
    fn test_upload_requires_url_and_file() {
        let args = Args::parse_from(["s3-presign-put", "--op", "upload", "--file", "a.txt"]);
        assert!(matches!(
            args.operation(),
            Err(Error::MissingArgument("url"))
        ));
        let args = Args::parse_from([
            "s3-presign-put",
            "--op",
            "upload",
            "--url",
            "http://localhost/b/k",
        ]);
        assert!(matches!(
            args.operation(),
            Err(Error::MissingArgument("file"))
        ));
    }

    #[test]
    fn test_unknown_op_rejected() {
        let result = Args::try_parse_from(["s3-presign-put", "--op", "delete"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_url_op_with_endpoint() {
        let args = Args::parse_from([
            "s3-presign-put",
            "--op",
            "url",
            "--bucket",
            "b",
            "--key",
            "k",
            "--endpoint",
            "http://127.0.0.1:9000",
            "--path-style",
        ]);
        match args.operation().unwrap() {
            Operation::GenerateUrl { params } => {
                assert_eq!(params.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
                assert!(params.path_style);
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_url_op_prints_only_the_url() {
        let (status, out) = invoke(&[
            "s3-presign-put",
            "--op",
            "url",
            "--bucket",
            "b",
            "--key",
            "k",
            "--region",
            "us-east-1",
        ])
        .await;
        assert_eq!(status, 0);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        let url = url::Url::parse(lines[0]).unwrap();
        assert!(url.host_str().unwrap().starts_with("b."));
        assert!(url.path().ends_with("/k"));
        assert!(lines[0].contains("X-Amz-Expires=60"));
    }

    #[tokio::test]
    async fn test_url_op_json_output() {
        let before = chrono::Utc::now();
        let (status, out) = invoke(&[
            "s3-presign-put",
            "--op",
            "url",
            "--bucket",
            "b",
            "--key",
            "k",
            "--region",
            "us-east-1",
            "--json",
        ])
        .await;
        assert_eq!(status, 0);
        let presigned: PresignedUrl = serde_json::from_str(out.trim_end()).unwrap();
        assert!(presigned.url.contains("X-Amz-Expires=60"));
        let window = presigned.expires_at - before;
        assert!(window.num_seconds() >= 59 && window.num_seconds() <= 65);
    }

    #[tokio::test]
    async fn test_upload_op_prints_raw_body() {
        let (endpoint, hits) = spawn_denying_storage().await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hello").unwrap();
        let url = format!("{}/b/a.txt", endpoint);
        let (status, out) = invoke(&[
            "s3-presign-put",
            "--op",
            "upload",
            "--url",
            &url,
            "--file",
            file.to_str().unwrap(),
        ])
        .await;
        assert_eq!(status, 0);
        assert_eq!(out, "<Error><Code>AccessDenied</Code></Error>\n");
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_prints_error_and_exits_one() {
        let (endpoint, hits) = spawn_denying_storage().await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let url = format!("{}/b/missing.txt", endpoint);
        let (status, out) = invoke(&[
            "s3-presign-put",
            "--op",
            "upload",
            "--url",
            &url,
            "--file",
            missing.to_str().unwrap(),
        ])
        .await;
        assert_eq!(status, 1);
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("missing.txt"));
        assert_eq!(*hits.lock().unwrap(), 0);
    }
}
