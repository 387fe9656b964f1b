use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use tracing::info;

use crate::cli::{IngestArgs, resolve_db_path};
use crate::model::{IngestReport, UploadRequest};
use crate::util::{ensure_directory, utc_compact_string, write_json_pretty};

use super::pipeline::ingest;
use super::router::{BENCHTOP_FILAMENT_DIAMETER, CHARACTERISTICS, LIVE_PRINT_DATA, PARTS_QUALITY};
use super::store;

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let manifest_dir = args.data_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let db_path = resolve_db_path(&args.data_root, args.db_path.as_ref());
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let requests = collect_requests(&args)?;
    if requests.is_empty() {
        bail!(
            "no directories selected; pass --parts-quality, --diameter, --characteristics, --live-print or --request"
        );
    }
    if args.report_path.is_some() && requests.len() > 1 {
        bail!("--report-path can only be used with a single upload request");
    }

    // Schema is created once up front so concurrent workers only ever write rows.
    drop(store::open_store(&db_path)?);

    info!(
        db_path = %db_path.display(),
        requests = requests.len(),
        "starting ingest"
    );

    let reports = if requests.len() == 1 {
        vec![ingest_request(&db_path, &requests[0])?]
    } else {
        ingest_concurrently(&db_path, &requests)?
    };

    let stamp = utc_compact_string(started_ts);
    for (idx, report) in reports.iter().enumerate() {
        let report_path = match (&args.report_path, reports.len()) {
            (Some(path), _) => path.clone(),
            (None, 1) => manifest_dir.join(format!("ingest_run_{stamp}.json")),
            (None, _) => manifest_dir.join(format!("ingest_run_{stamp}_{:02}.json", idx + 1)),
        };
        write_json_pretty(&report_path, report)?;
        info!(path = %report_path.display(), run_id = %report.run_id, "wrote ingest run manifest");

        if args.json {
            let rendered =
                serde_json::to_string_pretty(report).context("failed to render ingest report")?;
            println!("{rendered}");
        }
    }

    let failed: usize = reports.iter().map(|report| report.summary.files_failed).sum();
    let succeeded: usize = reports
        .iter()
        .map(|report| report.summary.files_succeeded)
        .sum();
    info!(succeeded, failed, "ingest completed");

    Ok(())
}

fn ingest_request(db_path: &Path, request: &UploadRequest) -> Result<IngestReport> {
    let mut connection = store::open_store(db_path)?;
    Ok(ingest(request, &mut connection))
}

/// One worker and one connection per request; SQLite serializes the commits.
pub(super) fn ingest_concurrently(
    db_path: &Path,
    requests: &[UploadRequest],
) -> Result<Vec<IngestReport>> {
    thread::scope(|scope| {
        let workers = requests
            .iter()
            .map(|request| scope.spawn(move || ingest_request(db_path, request)))
            .collect::<Vec<_>>();

        workers
            .into_iter()
            .map(|worker| {
                worker
                    .join()
                    .map_err(|_| anyhow!("ingest worker panicked"))?
            })
            .collect()
    })
}

fn collect_requests(args: &IngestArgs) -> Result<Vec<UploadRequest>> {
    let mut requests = Vec::with_capacity(args.requests.len() + 1);

    if args.has_directory_flags() {
        let mut request = UploadRequest::default();
        let flagged: [(&str, &Option<PathBuf>); 4] = [
            (PARTS_QUALITY, &args.parts_quality),
            (BENCHTOP_FILAMENT_DIAMETER, &args.diameter),
            (CHARACTERISTICS, &args.characteristics),
            (LIVE_PRINT_DATA, &args.live_print),
        ];
        for (purpose, directory) in flagged {
            if let Some(directory) = directory {
                request
                    .selected_directories
                    .insert(purpose.to_string(), directory.clone());
            }
        }
        requests.push(request);
    }

    for path in &args.requests {
        requests.push(load_request(path)?);
    }

    Ok(requests)
}

pub(super) fn load_request(path: &Path) -> Result<UploadRequest> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let request: UploadRequest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse upload request {}", path.display()))?;

    info!(
        path = %path.display(),
        directories = request.selected_directories.len(),
        "loaded upload request"
    );

    Ok(request)
}
