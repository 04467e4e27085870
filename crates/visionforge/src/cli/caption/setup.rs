//! Caption session setup: provider, inputs, manifest and output paths.

use std::path::PathBuf;

use visionforge_core::manifest::{attach_manifest, parse_manifest};
use visionforge_core::{
    BatchOrchestrator, Config, ImageDiscovery, ItemCollection, ProcessingOptions, ProviderConfig,
};

use super::CaptionArgs;

/// Everything a caption run needs, assembled by [`prepare_session`].
pub struct CaptionSession {
    pub orchestrator: BatchOrchestrator,
    pub provider: ProviderConfig,
    pub items: ItemCollection,
    pub prompt: String,
    pub options: ProcessingOptions,
    pub dataset_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

/// Resolve the provider, discover the inputs and attach manifest records.
///
/// Provider problems (missing key, missing endpoint) are reported here,
/// before any image is touched.
pub fn prepare_session(args: &CaptionArgs, config: &Config) -> anyhow::Result<CaptionSession> {
    let provider = args.provider.resolve(config);
    let orchestrator = BatchOrchestrator::from_config(&provider, &config.request)?;

    let prompt = args
        .prompt
        .clone()
        .unwrap_or_else(|| config.prompt.text.clone());
    if prompt.trim().is_empty() {
        anyhow::bail!("Prompt is empty");
    }

    let items = collect_items(args, config)?;
    let options = args.fields.apply(config.options);

    let dataset_path = args
        .output
        .clone()
        .unwrap_or_else(|| config.dataset_path());
    let report_path = if args.no_report {
        None
    } else {
        Some(
            args.report
                .clone()
                .unwrap_or_else(|| config.report_path()),
        )
    };

    tracing::info!(
        provider = %provider.kind,
        model = %provider.model,
        images = items.len(),
        "Caption session ready"
    );

    Ok(CaptionSession {
        orchestrator,
        provider,
        items,
        prompt,
        options,
        dataset_path,
        report_path,
    })
}

/// Discover images and build the working collection.
fn collect_items(args: &CaptionArgs, config: &Config) -> anyhow::Result<ItemCollection> {
    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input path does not exist: {}", input.display());
        }
    }

    let discovery = ImageDiscovery::new(config.processing.clone());
    let images = discovery.discover_all(&args.inputs);
    if images.is_empty() {
        anyhow::bail!("No supported images found in the given inputs");
    }

    let mut items = ItemCollection::new();
    for image in images {
        items.add(image.into_source());
    }

    if let Some(manifest_path) = &args.manifest {
        let text = std::fs::read_to_string(manifest_path).map_err(|e| {
            anyhow::anyhow!("Failed to read manifest {}: {e}", manifest_path.display())
        })?;
        let entries = parse_manifest(&text);
        let attached = attach_manifest(&mut items, &entries);
        if attached == 0 {
            tracing::warn!(
                "No manifest record matched an input image by file name ({} records)",
                entries.len()
            );
        } else {
            tracing::info!("Matched {attached} manifest records");
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::types::{ProviderArg, ProviderArgs};
    use visionforge_core::{ConfigError, ItemStatus};

    fn args_for(inputs: Vec<PathBuf>) -> CaptionArgs {
        CaptionArgs {
            inputs,
            provider: ProviderArgs {
                provider: Some(ProviderArg::Openai),
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_prepare_discovers_and_attaches_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"a").unwrap();
        std::fs::write(dir.path().join("b.png"), b"b").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        let manifest = dir.path().join("meta.jsonl");
        std::fs::write(&manifest, "{\"image\": \"a.jpg\", \"label\": \"cat\"}\n").unwrap();

        let mut args = args_for(vec![dir.path().to_path_buf()]);
        args.manifest = Some(manifest);
        args.output = Some(dir.path().join("out.jsonl"));
        let session = prepare_session(&args, &Config::default()).unwrap();

        assert_eq!(session.items.len(), 2);
        assert!(session.items.iter().all(|i| i.status() == ItemStatus::Idle));
        let with_manifest: Vec<_> = session
            .items
            .iter()
            .filter(|i| i.original_fields.is_some())
            .map(|i| i.image.file_name())
            .collect();
        assert_eq!(with_manifest, vec!["a.jpg"]);
        assert_eq!(session.dataset_path, dir.path().join("out.jsonl"));
        assert_eq!(session.report_path, Some(PathBuf::from("stats_report.txt")));
        assert_eq!(session.orchestrator.adapter().name(), "openai");
    }

    #[test]
    fn test_empty_credential_is_refused() {
        let config = Config::default();
        let mut provider = args_for(vec![]).provider.resolve(&config);
        provider.api_key = String::new();

        let err = BatchOrchestrator::from_config(&provider, &config.request)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::MissingCredential { ref env_var, .. } if env_var == "OPENAI_API_KEY"
        ));
    }

    #[test]
    fn test_prepare_rejects_missing_input() {
        let args = args_for(vec![PathBuf::from("/definitely/not/here")]);
        let err = prepare_session(&args, &Config::default()).err().unwrap();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_prepare_rejects_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_for(vec![dir.path().to_path_buf()]);
        let err = prepare_session(&args, &Config::default()).err().unwrap();
        assert!(err.to_string().contains("No supported images"));
    }
}
