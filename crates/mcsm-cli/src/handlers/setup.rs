//! `mcsm setup`.

use anyhow::Result;
use mcsm_runtime::{PistonArtifactSource, SetupRequest, run_setup};

use crate::progress::ProgressSink;

pub async fn execute(request: SetupRequest) -> Result<()> {
    let sink = ProgressSink::new();
    let report = run_setup(&request, &PistonArtifactSource::new(), &sink).await?;

    println!();
    println!("Minecraft {} is ready in {}", report.version_id, request.server_dir.display());
    if report.downloaded {
        println!("Downloaded {}", report.jar_path.display());
    }
    if !request.accept_eula {
        println!("The EULA was not accepted; edit eula.txt before starting the server.");
    }
    Ok(())
}
