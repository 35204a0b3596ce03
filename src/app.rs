//! Wires parsing, fetching, drift checking and printing into a single run.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use futures::future::try_join_all;
use tracing::Span;

use crate::drift::{DEFAULT_WORKERS, DriftChecker};
use crate::error::Ec2DiffError;
use crate::instance::{Attribute, Instance, InstanceMap};
use crate::output::ReportPrinter;
use crate::providers::{LiveFetcher, ProviderError};
use crate::report::Report;
use crate::terraform::ParserRegistry;

/// Validated inputs for one drift run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub file: PathBuf,
    /// Raw `--instances` entries, either bare IDs or `label=id`.
    pub instance_ids: Vec<String>,
    /// Empty means every supported attribute.
    pub attributes: Vec<Attribute>,
    pub workers: usize,
}

impl RunConfig {
    /// Trims list entries, drops empty ones and rejects unknown attributes.
    pub fn new(
        file: impl Into<PathBuf>,
        instances: &[String],
        attributes: &[String],
        workers: usize,
    ) -> Result<Self, Ec2DiffError> {
        Ok(Self {
            file: file.into(),
            instance_ids: clean_list(instances),
            attributes: validate_attributes(&clean_list(attributes))?,
            workers,
        })
    }

    pub fn is_targeted(&self) -> bool {
        !self.instance_ids.is_empty()
    }

    /// Instance IDs named by `--instances`, with any `label=` prefix removed.
    pub fn target_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.instance_ids
            .iter()
            .map(|entry| match entry.split_once('=') {
                Some((_, id)) => id.trim().to_string(),
                None => entry.clone(),
            })
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect()
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fails on the first name outside the supported set.
pub fn validate_attributes(names: &[String]) -> Result<Vec<Attribute>, Ec2DiffError> {
    names
        .iter()
        .map(|name| name.parse::<Attribute>().map_err(Ec2DiffError::from))
        .collect()
}

pub fn supported_attributes_text() -> String {
    let mut text = String::from("Supported attributes:\n");
    for name in Attribute::supported_names() {
        text.push_str(name);
        text.push('\n');
    }
    text
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            instance_ids: Vec::new(),
            attributes: Vec::new(),
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Resolves the parser for `config.file` and reads the declared instances.
///
/// Runs before any fetcher is built, so unsupported or unreadable files fail
/// without touching AWS.
pub fn load_declared(
    config: &RunConfig,
    registry: &ParserRegistry,
) -> Result<InstanceMap, Ec2DiffError> {
    let parser = registry.get(&config.file)?;
    tracing::info!(file = %config.file.display(), parser = parser.name(), "parsing declared state");
    Ok(parser.parse(&config.file, &config.instance_ids)?)
}

/// Compares `declared` against the live side and prints the reports,
/// sorted by instance ID.
///
/// Nothing is printed when any step fails.
pub async fn execute(
    config: &RunConfig,
    declared: InstanceMap,
    fetcher: &dyn LiveFetcher,
    printer: &mut dyn ReportPrinter,
) -> Result<Vec<Report>, Ec2DiffError> {
    let span = tracing::info_span!(
        "ec2diff",
        file = %config.file.display(),
        fetcher = fetcher.name()
    );

    let checker = DriftChecker::new(config.workers);
    let mut reports = if config.is_targeted() {
        check_targets(&span, config, &checker, fetcher, declared).await?
    } else {
        check_scan(&span, config, &checker, fetcher, declared).await?
    };

    reports.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
    let drifted = reports.iter().filter(|report| report.has_drift()).count();
    tracing::info!(parent: &span, reports = reports.len(), drifted, "drift check finished");

    printer.print(&reports)?;
    Ok(reports)
}

/// Compares every live page against the declared instances it contains,
/// then reports declared instances that never showed up live.
async fn check_scan(
    span: &Span,
    config: &RunConfig,
    checker: &DriftChecker,
    fetcher: &dyn LiveFetcher,
    mut declared: InstanceMap,
) -> Result<Vec<Report>, Ec2DiffError> {
    let mut reports = Vec::new();
    let mut pages = fetcher.pages();

    while let Some(page) = pages.next().await {
        let page = page?;
        let subset: InstanceMap = page
            .instances
            .keys()
            .filter_map(|id| declared.remove_entry(id))
            .collect();
        tracing::debug!(
            parent: span,
            page = page.number,
            live = page.instances.len(),
            declared = subset.len(),
            "checking page"
        );

        reports.extend(
            checker
                .check_drift(
                    span,
                    Arc::new(page.instances),
                    Arc::new(subset),
                    &config.attributes,
                )
                .await,
        );
    }

    if !declared.is_empty() {
        tracing::info!(parent: span, count = declared.len(), "declared instances not found live");
        reports.extend(
            checker
                .check_drift(
                    span,
                    Arc::new(InstanceMap::new()),
                    Arc::new(declared),
                    &config.attributes,
                )
                .await,
        );
    }

    Ok(reports)
}

async fn check_targets(
    span: &Span,
    config: &RunConfig,
    checker: &DriftChecker,
    fetcher: &dyn LiveFetcher,
    mut declared: InstanceMap,
) -> Result<Vec<Report>, Ec2DiffError> {
    let targets = config.target_ids();
    if let Some(unknown) = targets.iter().find(|id| !declared.contains_key(*id)) {
        return Err(Ec2DiffError::Usage(format!(
            "instance '{}' is not declared in {}",
            unknown,
            config.file.display()
        )));
    }
    declared.retain(|id, _| targets.contains(id));

    let live = fetch_targets(span, fetcher, &targets).await?;
    Ok(checker
        .check_drift(span, Arc::new(live), Arc::new(declared), &config.attributes)
        .await)
}

/// Looks up each ID; instances the API no longer knows become empty stand-ins.
async fn fetch_targets(
    span: &Span,
    fetcher: &dyn LiveFetcher,
    ids: &[String],
) -> Result<InstanceMap, ProviderError> {
    let lookups = ids.iter().map(|id| async move {
        match fetcher.get_instance(id).await {
            Ok(instance) => Ok(instance),
            Err(err) if err.is_not_found() => {
                tracing::warn!(parent: span, instance_id = %id, "instance not found live, treating as deleted");
                Ok(Instance::deleted(id.as_str()))
            }
            Err(err) => Err(err),
        }
    });

    let instances = try_join_all(lookups).await?;
    Ok(instances
        .into_iter()
        .map(|instance| (instance.id.clone(), instance))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LivePage;
    use crate::report::Comment;
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use std::io;
    use std::sync::Mutex;

    struct PagedFetcher {
        pages: Vec<Vec<Instance>>,
        lookups: Mutex<Vec<String>>,
    }

    impl PagedFetcher {
        fn new(pages: Vec<Vec<Instance>>) -> Self {
            Self {
                pages,
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LiveFetcher for PagedFetcher {
        fn name(&self) -> &str {
            "paged"
        }

        fn pages(&self) -> BoxStream<'_, Result<LivePage, ProviderError>> {
            stream::iter(self.pages.iter().enumerate().map(|(index, instances)| {
                Ok(LivePage {
                    number: index as u32 + 1,
                    instances: instances
                        .iter()
                        .map(|instance| (instance.id.clone(), instance.clone()))
                        .collect(),
                })
            }))
            .boxed()
        }

        async fn get_instance(&self, instance_id: &str) -> Result<Instance, ProviderError> {
            self.lookups.lock().unwrap().push(instance_id.to_string());
            self.pages
                .iter()
                .flatten()
                .find(|instance| instance.id == instance_id)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound {
                    instance_id: instance_id.to_string(),
                })
        }
    }

    #[derive(Default)]
    struct RecordingPrinter {
        printed: Vec<Vec<Report>>,
    }

    impl ReportPrinter for RecordingPrinter {
        fn print(&mut self, reports: &[Report]) -> io::Result<()> {
            self.printed.push(reports.to_vec());
            Ok(())
        }
    }

    fn instance(id: &str, instance_type: &str) -> Instance {
        Instance {
            instance_type: Some(instance_type.to_string()),
            ..Instance::new(id)
        }
    }

    fn state_file(instances: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let resources: Vec<_> = instances
            .iter()
            .map(|(id, instance_type)| {
                serde_json::json!({
                    "mode": "managed",
                    "type": "aws_instance",
                    "name": id,
                    "instances": [{"attributes": {"id": id, "instance_type": instance_type}}]
                })
            })
            .collect();
        let file = tempfile::Builder::new().suffix(".tfstate").tempfile().unwrap();
        std::fs::write(
            file.path(),
            serde_json::json!({"version": 4, "resources": resources}).to_string(),
        )
        .unwrap();
        file
    }

    async fn run(
        config: &RunConfig,
        fetcher: &PagedFetcher,
        printer: &mut RecordingPrinter,
    ) -> Result<Vec<Report>, Ec2DiffError> {
        let declared = load_declared(config, &ParserRegistry::default())?;
        execute(config, declared, fetcher, printer).await
    }

    fn config(file: &tempfile::NamedTempFile, instances: &[&str], attrs: &[&str]) -> RunConfig {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        RunConfig::new(file.path(), &to_vec(instances), &to_vec(attrs), 2).unwrap()
    }

    #[test]
    fn test_run_config_trims_lists() {
        let config = RunConfig::new(
            "state.tfstate",
            &[" i-1 ".to_string(), "".to_string(), "i-2".to_string()],
            &[" instance_type".to_string(), " ".to_string()],
            4,
        )
        .unwrap();

        assert_eq!(config.instance_ids, vec!["i-1", "i-2"]);
        assert_eq!(config.attributes, vec![Attribute::InstanceType]);
    }

    #[test]
    fn test_run_config_rejects_unsupported_attribute() {
        let err = RunConfig::new("missing.tfstate", &[], &["ami".to_string()], 4).unwrap_err();
        assert!(matches!(err, Ec2DiffError::UnsupportedAttribute(_)));
        let message = err.to_string();
        assert!(message.contains("'ami' not supported"));
        assert!(message.contains("security_groups"));
    }

    #[test]
    fn test_target_ids_strip_labels_and_duplicates() {
        let config = RunConfig {
            instance_ids: vec!["web=i-1".to_string(), "db = i-2".to_string(), "i-1".to_string()],
            ..RunConfig::default()
        };
        assert_eq!(config.target_ids(), vec!["i-1", "i-2"]);
    }

    #[test]
    fn test_supported_attributes_text() {
        let text = supported_attributes_text();
        assert!(text.starts_with("Supported attributes:\n"));
        for attr in Attribute::ALL {
            assert!(text.lines().any(|line| line == attr.as_str()));
        }
    }

    #[tokio::test]
    async fn test_scan_reports_every_instance_sorted() {
        let file = state_file(&[("i-1", "t2.small"), ("i-9", "t2.nano"), ("i-2", "t3.micro")]);
        let fetcher = PagedFetcher::new(vec![
            vec![instance("i-2", "t3.micro"), instance("i-5", "m5.large")],
            vec![instance("i-1", "t2.micro")],
        ]);
        let mut printer = RecordingPrinter::default();

        let reports = run(
            &config(&file, &[], &["instance_type"]),
            &fetcher,
            &mut printer,
        )
        .await
        .unwrap();

        let summary: Vec<_> = reports
            .iter()
            .map(|r| (r.instance_id.as_str(), r.comment))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("i-1", Comment::DriftDetected),
                ("i-2", Comment::NoDriftDetected),
                ("i-5", Comment::MissingState),
                ("i-9", Comment::MissingState),
            ]
        );
        assert_eq!(printer.printed, vec![reports]);
        assert!(fetcher.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_targeted_run_treats_vanished_instance_as_deleted() {
        let file = state_file(&[("i-1", "t2.micro"), ("i-2", "t2.nano"), ("i-3", "t2.small")]);
        let fetcher = PagedFetcher::new(vec![vec![instance("i-1", "t2.micro")]]);
        let mut printer = RecordingPrinter::default();

        let reports = run(
            &config(&file, &["i-1", "i-2"], &[]),
            &fetcher,
            &mut printer,
        )
        .await
        .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].comment, Comment::NoDriftDetected);
        assert_eq!(reports[1].instance_id, "i-2");
        assert_eq!(reports[1].comment, Comment::DriftDetected);
        assert_eq!(reports[1].drifted_attributes(), vec![Attribute::InstanceType]);

        let mut lookups = fetcher.lookups.lock().unwrap().clone();
        lookups.sort();
        assert_eq!(lookups, vec!["i-1", "i-2"]);
    }

    #[tokio::test]
    async fn test_targeted_run_rejects_undeclared_instance() {
        let file = state_file(&[("i-1", "t2.micro")]);
        let fetcher = PagedFetcher::new(Vec::new());
        let mut printer = RecordingPrinter::default();

        let err = run(
            &config(&file, &["i-404"], &[]),
            &fetcher,
            &mut printer,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Ec2DiffError::Usage(_)));
        assert!(printer.printed.is_empty());
    }

    #[test]
    fn test_unsupported_extension_fails_before_fetching() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();

        let err = load_declared(&config(&file, &[], &[]), &ParserRegistry::default()).unwrap_err();

        assert!(matches!(err, Ec2DiffError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("no parser found"));
    }

    #[test]
    fn test_unreadable_file_fails_before_fetching() {
        let config = RunConfig {
            file: PathBuf::from("/nonexistent/terraform.tfstate"),
            ..RunConfig::default()
        };

        let err = load_declared(&config, &ParserRegistry::default()).unwrap_err();

        assert!(matches!(err, Ec2DiffError::Parse(_)));
    }
}
