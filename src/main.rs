use std::net::SocketAddr;
use std::sync::Arc;

use chunk_cluster::catalog::memory::MetadataCatalog;
use chunk_cluster::cluster::registry::ClusterRegistry;
use chunk_cluster::transfer::download::DownloadCoordinator;
use chunk_cluster::transfer::handlers::router;
use chunk_cluster::transfer::upload::UploadCoordinator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut bind_addr: SocketAddr = "127.0.0.1:8080".parse()?;
    let mut nodes: Vec<String> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = args[i + 1].parse()?;
                i += 2;
            }
            "--node" => {
                nodes.push(args[i + 1].clone());
                i += 2;
            }
            _ => {
                eprintln!(
                    "Usage: {} [--bind <addr:port>] [--node <address>]...",
                    args[0]
                );
                eprintln!(
                    "Example: {} --bind 127.0.0.1:8080 --node storage0 --node storage1",
                    args[0]
                );
                std::process::exit(1);
            }
        }
    }

    if nodes.is_empty() {
        nodes = (0..5).map(|index| format!("storage{}", index)).collect();
    }

    // 1. Cluster: one empty store per configured node.
    let registry = Arc::new(ClusterRegistry::new());
    for node in &nodes {
        registry.add_node(node);
    }
    tracing::info!("Cluster nodes: {:?}", registry.node_addresses());

    // 2. Metadata catalog:
    let catalog = Arc::new(MetadataCatalog::new());

    // 3. Coordinators. The node list given here is the round-robin order
    //    for every upload, independent of later membership changes.
    let uploads = Arc::new(UploadCoordinator::new(
        catalog.clone(),
        registry.clone(),
        nodes.clone(),
    ));
    let downloads = Arc::new(DownloadCoordinator::new(catalog.clone(), registry.clone()));

    // 4. HTTP router:
    let app = router(uploads, downloads);

    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
