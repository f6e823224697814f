mod commands;
mod utils;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "atlasflow")]
#[command(about = "MongoDB Atlas のリソースを YAML で宣言し、同期する", long_about = None)]
struct Cli {
    /// デバッグログを出力 (RUST_LOG より優先)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Atlas のアクセストークンを検証
    Auth,
    /// 宣言済みリソースを作成
    Create {
        /// リソースアドレス (<type>.<name>)
        address: String,
    },
    /// Atlas からリソースのステートを更新
    Read {
        /// リソースアドレス (<type>.<name>)
        address: String,
    },
    /// 既存リソースに宣言内容を適用
    Update {
        /// リソースアドレス (<type>.<name>)
        address: String,
    },
    /// リソースを削除し、ステートから外す
    Delete {
        /// リソースアドレス (<type>.<name>)
        address: String,
    },
    /// 既存の Atlas エンティティをステートに取り込む
    Import {
        /// リソースタイプ (例: mongodbatlas_cluster)
        resource_type: String,
        /// リソースのローカル名
        name: String,
        /// インポートID (例: {project_id}-{cluster_name})
        import_id: String,
    },
    /// 共有ティアクラスタのリストアジョブ一覧を表示
    #[command(name = "restore-jobs")]
    RestoreJobs {
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        cluster_name: String,
    },
    /// ローカルのステートを確認
    #[command(subcommand)]
    State(StateCommands),
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum StateCommands {
    /// ステート内のリソース一覧を表示
    List {
        /// 指定したタイプのリソースのみ表示 (例: mongodbatlas_cluster)
        #[arg(long = "type")]
        resource_type: Option<String>,
    },
    /// リソースの保存済み属性を表示
    Show {
        /// リソースアドレス (<type>.<name>)
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // バージョン表示とステート確認には認証情報が不要
    match &cli.command {
        Commands::Version => {
            println!("atlasflow {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::State(state_cmd) => {
            let manager = utils::state_manager()?;
            return match state_cmd {
                StateCommands::List { resource_type } => {
                    commands::state::list(&manager, resource_type.as_deref()).await
                }
                StateCommands::Show { address } => commands::state::show(&manager, address).await,
            };
        }
        _ => {}
    }

    let provider = utils::provider_from_env()?;
    let manager = utils::state_manager()?;

    match cli.command {
        Commands::Auth => commands::auth::handle(&provider).await?,
        Commands::Create { address } => {
            commands::resource::create(&provider, &manager, &address).await?
        }
        Commands::Read { address } => {
            commands::resource::read(&provider, &manager, &address).await?
        }
        Commands::Update { address } => {
            commands::resource::update(&provider, &manager, &address).await?
        }
        Commands::Delete { address } => {
            commands::resource::delete(&provider, &manager, &address).await?
        }
        Commands::Import {
            resource_type,
            name,
            import_id,
        } => {
            commands::resource::import(&provider, &manager, &resource_type, &name, &import_id)
                .await?
        }
        Commands::RestoreJobs {
            project_id,
            cluster_name,
        } => commands::restore_jobs::handle(&provider, &project_id, &cluster_name).await?,
        Commands::Version | Commands::State(_) => {
            unreachable!("handled before provider setup")
        }
    }

    Ok(())
}
