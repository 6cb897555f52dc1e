use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use carepoint_assessment::{
    AssessmentRequest, AssessmentService, Disease, LabOutcome, LabResults, MalariaTests,
    SymptomInput, TyphoidTests,
};
use carepoint_core::load_seed_users;

#[derive(Parser)]
#[command(name = "carepoint")]
#[command(about = "CarePoint clinic tools: offline risk assessment and config checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score symptoms against malaria and typhoid and print the assessment as JSON
    Assess {
        /// Symptom name, optionally with a severity: `fever` or `fever:severe`. Repeatable.
        #[arg(long = "symptom", value_name = "NAME[:SEVERITY]")]
        symptoms: Vec<String>,
        /// Malaria rapid diagnostic test
        #[arg(long, value_enum, default_value_t = LabArg::NotDone)]
        malaria_rapid_test: LabArg,
        /// Malaria microscopy
        #[arg(long, value_enum, default_value_t = LabArg::NotDone)]
        malaria_microscopy: LabArg,
        /// Typhoid Widal test
        #[arg(long, value_enum, default_value_t = LabArg::NotDone)]
        typhoid_widal_test: LabArg,
        /// Typhoid blood culture
        #[arg(long, value_enum, default_value_t = LabArg::NotDone)]
        typhoid_blood_culture: LabArg,
    },
    /// Print the symptom catalog for one disease, or both
    Catalog {
        /// `malaria` or `typhoid`
        disease: Option<String>,
    },
    /// Validate a seed-users YAML file
    CheckSeed {
        /// Path to the seed file
        path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LabArg {
    Positive,
    Negative,
    NotDone,
}

impl From<LabArg> for LabOutcome {
    fn from(arg: LabArg) -> Self {
        match arg {
            LabArg::Positive => LabOutcome::Positive,
            LabArg::Negative => LabOutcome::Negative,
            LabArg::NotDone => LabOutcome::NotDone,
        }
    }
}

/// `fever:severe` becomes a named symptom with a severity; a bare name has none.
fn symptom_arg(raw: &str) -> SymptomInput {
    match raw.split_once(':') {
        Some((name, severity)) => SymptomInput {
            symptom: Some(name.to_string()),
            severity: Some(severity.to_string()),
            duration: None,
        },
        None => SymptomInput::named(raw),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Assess {
            symptoms,
            malaria_rapid_test,
            malaria_microscopy,
            typhoid_widal_test,
            typhoid_blood_culture,
        } => {
            let request = AssessmentRequest {
                symptoms: Some(symptoms.iter().map(|s| symptom_arg(s)).collect()),
                test_results: Some(LabResults {
                    malaria: MalariaTests {
                        rapid_test: malaria_rapid_test.into(),
                        microscopy: malaria_microscopy.into(),
                    },
                    typhoid: TyphoidTests {
                        widal_test: typhoid_widal_test.into(),
                        blood_culture: typhoid_blood_culture.into(),
                    },
                }),
            };
            let assessment = AssessmentService::assess_request(request)?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        Commands::Catalog { disease } => {
            let diseases = match disease {
                Some(name) => vec![name.parse::<Disease>()?],
                None => Disease::ALL.to_vec(),
            };
            for disease in diseases {
                println!("{}:", disease.name());
                for symptom in disease.symptoms() {
                    println!("  {symptom}");
                }
            }
        }
        Commands::CheckSeed { path } => {
            let users = load_seed_users(&path)?;
            println!("{}: {} account(s)", path.display(), users.len());
            for user in users {
                println!("  {} <{}> {}", user.name, user.email, user.role);
            }
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
