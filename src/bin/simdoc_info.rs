use clap::Parser;
use log::{info, warn};
use simdoc::{
    ArrayParams, MemoryDocument, MeshAccessor, MeshDocument, Result, SelectionType, Selections,
    init_log,
};

/// Print mesh and selection statistics of a json document snapshot
#[derive(Parser)]
#[command(name = "simdoc_info", version)]
struct Cli {
    /// Document snapshot (json)
    document: String,

    /// Split quadrangles into triangles (and 8-noded prisms into 6-noded prisms)
    #[arg(long)]
    split: bool,

    /// Skip inactive elements
    #[arg(long)]
    ignore_inactive: bool,

    /// Number of element centroids to print
    #[arg(long, default_value_t = 5)]
    centroids: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_log(&cli.log_level);

    let mut doc = MemoryDocument::from_json(&cli.document)?;

    {
        let msh = MeshAccessor::new(&doc);
        info!(
            "{}d model: {} nodes ({} per slice), {} elements ({} per layer)",
            doc.n_dims(),
            doc.n_nodes(),
            doc.n_nodes_per_slice(),
            doc.n_elems(),
            doc.n_elems_per_layer()
        );

        let imat = msh.incidence_matrix(cli.split, cli.ignore_inactive)?;
        info!("incidence matrix: {} groups", imat.len());

        let arrays = msh.incidence_matrix_with_coordinates(&ArrayParams {
            split_quads_to_triangles: cli.split,
            ignore_inactive: cli.ignore_inactive,
            as_2d: true,
            ..ArrayParams::default()
        });
        match arrays {
            Ok(arrays) => info!(
                "planar view: {} nodes, {} groups",
                arrays.x.len(),
                arrays.imat.len()
            ),
            Err(e) => warn!("no planar view: {e}"),
        }

        let centroids = msh.element_centroids(false, cli.ignore_inactive)?;
        for (i, c) in centroids.iter().take(cli.centroids).enumerate() {
            info!("centroid {i}: {}", serde_json::to_string(c)?);
        }
    }

    let sel = Selections::new(&mut doc);
    for t in SelectionType::SEARCH_ORDER {
        for name in sel.names(Some(t))? {
            info!("{t} selection {name}: {} items", sel.list(&name, Some(t))?.len());
        }
    }

    Ok(())
}
