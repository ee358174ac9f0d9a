use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use afcalc::genomics::{synthetic_site, Allele, GenotypeLikelihoods, PriorTable, VariantSite};
use afcalc::{AfCalcFactory, AfCalcResult, Calculation};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "afcalc", about = "Exact allele-frequency posterior calculator")]
struct Cli {
    /// Log model dispatch and allele pruning at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the AF posterior for one site read from a PL table.
    Compute {
        /// PL table: the first non-comment line lists alleles (reference
        /// first), every other line holds one sample's PLs.
        table: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Run a synthetic site with known allele counts through a model.
    Simulate {
        /// Heterozygous carriers per alternate allele, e.g. `2,1`.
        #[arg(long, value_delimiter = ',', required = true)]
        alt_counts: Vec<usize>,
        /// Number of called samples.
        #[arg(long)]
        samples: usize,
        /// Extra samples with all-zero PLs.
        #[arg(long, default_value_t = 0)]
        non_informative: usize,
        /// PL assigned to every genotype other than the true one.
        #[arg(long, default_value_t = 100)]
        non_type_pl: u32,
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Calculation model (defaults to the best model for the ploidy).
    #[arg(long)]
    model: Option<Calculation>,
    /// Sample ploidy.
    #[arg(long, default_value_t = 2)]
    ploidy: usize,
    /// Prior over the total alternate allele count.
    #[arg(long, value_enum, default_value_t = PriorKind::Human)]
    prior: PriorKind,
    /// Heterozygosity for the human prior.
    #[arg(long, default_value_t = 0.001)]
    heterozygosity: f64,
    /// Maximum alternate alleles to keep (defaults to all of them).
    #[arg(long)]
    max_alt: Option<usize>,
    /// log10 posterior odds above which an allele is called polymorphic.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    threshold: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PriorKind {
    Flat,
    Human,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compute { table, model } => {
            let site = read_pl_table(&table, model.ploidy)
                .with_context(|| format!("failed to read PL table {}", table.display()))?;
            run_site(&site, &model)?
        }
        Commands::Simulate {
            alt_counts,
            samples,
            non_informative,
            non_type_pl,
            model,
        } => {
            let site = synthetic_site(&alt_counts, samples, non_informative, non_type_pl, model.ploidy)
                .context("failed to build synthetic site")?;
            run_site(&site, &model)?
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_site(site: &VariantSite, args: &ModelArgs) -> Result<()> {
    let calculation = args
        .model
        .unwrap_or_else(|| Calculation::default_for(site.ploidy()));
    let max_alt = args.max_alt.unwrap_or_else(|| site.num_alt_alleles().max(1));
    let priors = match args.prior {
        PriorKind::Flat => PriorTable::flat(site.ploidy(), site.num_samples())
            .context("failed to build flat prior")?,
        PriorKind::Human => {
            PriorTable::human(site.ploidy(), site.num_samples(), args.heterozygosity)
                .context("failed to build human prior")?
        }
    };

    let factory = AfCalcFactory::default();
    let calc = factory
        .get(calculation, site.num_samples(), site.ploidy(), max_alt)
        .with_context(|| format!("failed to configure {calculation}"))?;
    let result = calc
        .compute(site, &priors)
        .with_context(|| format!("{calculation} failed"))?;

    print_result(calculation, &result, args.threshold);
    Ok(())
}

fn read_pl_table(path: &PathBuf, ploidy: usize) -> Result<VariantSite> {
    let reader = BufReader::new(File::open(path)?);
    let mut alleles: Option<Vec<Allele>> = None;
    let mut samples = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = line.split(|c: char| c == ',' || c.is_whitespace()).filter(|f| !f.is_empty());

        if alleles.is_none() {
            alleles = Some(
                fields
                    .enumerate()
                    .map(|(idx, bases)| Allele::new(bases, idx == 0))
                    .collect(),
            );
            continue;
        }

        let pls = fields
            .map(|f| f.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("invalid PL on line {}", line_no + 1))?;
        samples.push(GenotypeLikelihoods::from_pls(&pls));
    }

    let alleles = alleles.ok_or_else(|| anyhow::anyhow!("no allele line found"))?;
    Ok(VariantSite::new(alleles, ploidy, samples)?)
}

fn print_result(calculation: Calculation, result: &AfCalcResult, threshold: f64) {
    let alleles: Vec<String> = result
        .alleles_used_in_genotyping()
        .iter()
        .map(|a| a.to_string())
        .collect();
    println!("model\t{calculation}");
    println!("alleles\t{}", alleles.join(","));
    println!(
        "log10_posterior\tAF=0:{:.4}\tAF>0:{:.4}",
        result.log10_posterior_of_af_eq0(),
        result.log10_posterior_of_af_gt0()
    );
    println!(
        "log10_likelihood\tAF=0:{:.4}\tAF>0:{:.4}",
        result.log10_likelihood_of_af_eq0(),
        result.log10_likelihood_of_af_gt0()
    );
    println!("QUAL\t{:.2}", result.phred_scaled_qual());

    for allele in &result.alleles_used_in_genotyping()[1..] {
        println!(
            "{}\tMLE_AC={}\tlog10_posterior_AF>0={:.4}\tpolymorphic={}",
            allele,
            result.allele_count_at_mle(allele).unwrap_or(0),
            result
                .log10_posterior_of_af_gt0_for_allele(allele)
                .unwrap_or(f64::NEG_INFINITY),
            result.is_polymorphic(allele, threshold)
        );
    }
}
