//! fhir-owl - OWL to FHIR CodeSystem CLI
//!
//! Transforms an ontology and its imports into a FHIR batch bundle

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fhir_owl::{
    transform, CodeReplace, MissingImports, PublicationStatus, TransformConfig, TransformReport,
    FHIR_VERSION,
};

#[derive(Parser)]
#[command(name = "fhir-owl")]
#[command(version)]
#[command(about = "Transforms OWL ontologies into FHIR CodeSystem bundles", long_about = None)]
struct Cli {
    /// Input ontology document (OWL as RDF/XML, Turtle, N-Triples, ...)
    #[arg(short, long)]
    input: PathBuf,

    /// Output FHIR bundle (JSON)
    #[arg(short, long)]
    output: PathBuf,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IRI mappings file (remote-iri,local-path per line)
    #[arg(long)]
    iri_mappings: Option<PathBuf>,

    /// Comma-separated annotation properties for the publisher, in priority order
    #[arg(long, value_delimiter = ',')]
    publisher_prop: Vec<String>,

    /// Comma-separated annotation properties for the description, in priority order
    #[arg(long, value_delimiter = ',')]
    description_prop: Vec<String>,

    /// Annotation property holding the code system name
    #[arg(long)]
    name_prop: Option<String>,

    /// Resource id of the input ontology's code system
    #[arg(long)]
    id: Option<String>,

    /// Canonical URL of the input ontology's code system
    #[arg(long)]
    url: Option<String>,

    /// Business version of the input ontology's code system
    #[arg(long = "cs-version")]
    cs_version: Option<String>,

    /// Code system name
    #[arg(long)]
    name: Option<String>,

    /// Code system title
    #[arg(long)]
    title: Option<String>,

    /// Publication status (draft, active, retired, unknown)
    #[arg(long)]
    status: Option<PublicationStatus>,

    /// Publication date (YYYY, YYYY-MM, YYYY-MM-DD or a full dateTime)
    #[arg(long)]
    date: Option<String>,

    /// Code system publisher
    #[arg(long)]
    publisher: Option<String>,

    /// Code system description
    #[arg(long)]
    description: Option<String>,

    /// Why the code system is needed
    #[arg(long)]
    purpose: Option<String>,

    /// Copyright statement
    #[arg(long)]
    copyright: Option<String>,

    /// Value set with all the codes of the code system
    #[arg(long)]
    valueset: Option<String>,

    /// Language of the code system resource
    #[arg(long)]
    language: Option<String>,

    /// Mark the code system as experimental
    #[arg(long)]
    experimental: Option<bool>,

    /// Code system defines a compositional grammar
    #[arg(long)]
    compositional: Option<bool>,

    /// Codes need the code system version to be interpreted
    #[arg(long)]
    version_needed: Option<bool>,

    /// Annotation property holding concept codes
    #[arg(long)]
    code_prop: Option<String>,

    /// Replace text in every code: target,replacement
    #[arg(long)]
    code_replace: Option<CodeReplace>,

    /// Annotation property holding concept displays
    #[arg(long)]
    display_prop: Option<String>,

    /// Annotation property holding concept definitions
    #[arg(long)]
    definition_prop: Option<String>,

    /// Comma-separated annotation properties holding synonyms
    #[arg(long, value_delimiter = ',')]
    synonym_prop: Vec<String>,

    /// Comma-separated labels never used as displays or synonyms
    #[arg(long, value_delimiter = ',')]
    labels_to_exclude: Vec<String>,

    /// Emit concepts for deprecated classes
    #[arg(long)]
    include_deprecated: Option<bool>,

    /// Warn about imports that cannot be loaded instead of failing
    #[arg(long)]
    skip_missing_imports: bool,

    /// Never fetch imports over HTTP
    #[arg(long)]
    offline: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> Result<TransformConfig> {
        let mut config = match &self.config {
            Some(path) => TransformConfig::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => TransformConfig::default(),
        };

        if !self.publisher_prop.is_empty() {
            config = config.with_publisher_properties(trimmed(&self.publisher_prop));
        }
        if !self.description_prop.is_empty() {
            config = config.with_description_properties(trimmed(&self.description_prop));
        }
        if let Some(path) = &self.iri_mappings {
            config = config.with_iri_mappings(Some(path.clone()));
        }
        if self.skip_missing_imports {
            config = config.with_missing_imports(MissingImports::Skip);
        }
        if self.offline {
            config = config.with_remote_imports(false);
        }
        if self.name_prop.is_some() {
            config = config.with_name_property(self.name_prop.clone());
        }

        let mut overrides = config.code_system.clone();
        set(&mut overrides.id, &self.id);
        set(&mut overrides.url, &self.url);
        set(&mut overrides.version, &self.cs_version);
        set(&mut overrides.name, &self.name);
        set(&mut overrides.title, &self.title);
        set(&mut overrides.status, &self.status);
        set(&mut overrides.date, &self.date);
        set(&mut overrides.publisher, &self.publisher);
        set(&mut overrides.description, &self.description);
        set(&mut overrides.purpose, &self.purpose);
        set(&mut overrides.copyright, &self.copyright);
        set(&mut overrides.value_set, &self.valueset);
        set(&mut overrides.language, &self.language);
        set(&mut overrides.experimental, &self.experimental);
        set(&mut overrides.compositional, &self.compositional);
        set(&mut overrides.version_needed, &self.version_needed);

        let mut concepts = config.concepts.clone();
        set(&mut concepts.code_property, &self.code_prop);
        set(&mut concepts.code_replace, &self.code_replace);
        set(&mut concepts.display_property, &self.display_prop);
        set(&mut concepts.definition_property, &self.definition_prop);
        if !self.synonym_prop.is_empty() {
            concepts.synonym_properties = Some(trimmed(&self.synonym_prop));
        }
        if !self.labels_to_exclude.is_empty() {
            concepts.labels_to_exclude = trimmed(&self.labels_to_exclude);
        }
        if let Some(include) = self.include_deprecated {
            concepts.include_deprecated = include;
        }

        config = config.with_code_system(overrides).with_concepts(concepts);

        config.validate()?;
        Ok(config)
    }
}

/// Command-line values win over the configuration file
fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &TransformReport) {
    println!(
        "\n✓ FHIR {} bundle written to {}",
        FHIR_VERSION,
        report.output.display()
    );
    println!("  Ontologies in closure: {}", report.ontologies);
    println!("  Code systems: {}", report.code_systems.len());
    for cs in &report.code_systems {
        println!("    {:<32} {:>8} concepts  {}", cs.id, cs.concept_count, cs.url);
    }
    println!("  Concepts: {}", report.total_concepts());

    let warnings = report.warning_count();
    if warnings > 0 {
        println!("  Warnings: {}", warnings);
        for diagnostic in report
            .diagnostics
            .iter()
            .filter(|d| d.severity == fhir_owl::Severity::Warning)
        {
            println!("    {}", diagnostic);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.load_config()?;
    let report = transform(&cli.input, &cli.output, &config)
        .await
        .with_context(|| format!("Failed to transform {}", cli.input.display()))?;

    print_report(&report);
    Ok(())
}
