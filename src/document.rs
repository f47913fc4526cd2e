//! Capabilities expected from a simulation document
//!
//! The simulation engine owns the model. These traits list the read (and for
//! selections and time stepping, write) operations the helpers of this crate
//! rely on; any type exposing them can be used, including the in-memory
//! [`MemoryDocument`](crate::MemoryDocument).
use crate::{Dim, Param, Result, SelectionType};
use chrono::NaiveDateTime;

/// Mesh queries: counts, connectivity, coordinates and element state
pub trait MeshDocument {
    /// Number of space dimensions of the model (2 or 3)
    fn n_dims(&self) -> Dim;

    /// Total number of nodes
    fn n_nodes(&self) -> usize;

    /// Total number of elements
    fn n_elems(&self) -> usize;

    /// Number of nodes in a single slice of a layered model. Equals `n_nodes`
    /// for 2d models
    fn n_nodes_per_slice(&self) -> usize;

    /// Number of elements in a single layer of a layered model. Equals
    /// `n_elems` for 2d models
    fn n_elems_per_layer(&self) -> usize;

    /// Number of nodes of element `elem`
    fn n_elem_nodes(&self, elem: usize) -> Result<usize>;

    /// Global index of the `i`-th node of element `elem`
    fn node(&self, elem: usize, i: usize) -> Result<usize>;

    /// Number of elements the node `node` belongs to
    fn n_node_elems(&self, node: usize) -> Result<usize>;

    /// Index of the `i`-th element the node `node` belongs to
    fn node_elem(&self, node: usize, i: usize) -> Result<usize>;

    /// Local x coordinate of a node
    fn x(&self, node: usize) -> Result<f64>;

    /// Local y coordinate of a node
    fn y(&self, node: usize) -> Result<f64>;

    /// Local z coordinate of a node (3d models only)
    fn z(&self, node: usize) -> Result<f64>;

    /// Offset between the local and the global coordinate system along x
    fn origin_x(&self) -> f64;

    /// Offset between the local and the global coordinate system along y
    fn origin_y(&self) -> f64;

    /// Check if an element is active
    fn is_elem_active(&self, elem: usize) -> Result<bool>;

    /// Values of a nodal parameter for all the nodes
    fn param_values(&self, param: Param) -> Result<Vec<f64>>;
}

/// Named selections of nodes, elements, edges or fractures.
/// Selection ids are only meaningful together with their type.
pub trait SelectionDocument {
    /// Number of selections of a given type
    fn n_selections(&self, sel_type: SelectionType) -> usize;

    /// Id of the selection `name`, or `None` if there is no such selection
    fn find_selection(&self, sel_type: SelectionType, name: &str) -> Option<usize>;

    /// Name of a selection
    fn selection_name(&self, sel_type: SelectionType, id: usize) -> Result<String>;

    /// Items of a selection, in the order they are stored
    fn selection_items(&self, sel_type: SelectionType, id: usize) -> Result<Vec<usize>>;

    /// Create a new, empty selection and return its id
    fn create_selection(&mut self, sel_type: SelectionType, name: &str) -> Result<usize>;

    /// Add an item to a selection
    fn set_selection_item(&mut self, sel_type: SelectionType, id: usize, item: usize)
    -> Result<()>;

    /// Remove an item from a selection
    fn clear_selection_item(
        &mut self,
        sel_type: SelectionType,
        id: usize,
        item: usize,
    ) -> Result<()>;
}

/// Time stepping control of the simulation engine. Times are in days.
pub trait SimulationDocument {
    /// Current absolute simulation time
    fn absolute_time(&self) -> f64;

    /// Final simulation time
    fn final_time(&self) -> f64;

    /// Current time increment
    fn time_increment(&self) -> f64;

    /// Calendar date corresponding to the simulation time 0, if set
    fn reference_time(&self) -> Option<NaiveDateTime>;

    /// Perform a single time step
    fn single_step(&mut self) -> Result<()>;

    /// Terminate the simulation
    fn stop(&mut self) -> Result<()>;

    /// Time steps stored in the results file, as `(file_index, simulation_time)`
    fn stored_time_steps(&self) -> Result<Vec<(usize, f64)>>;

    /// Load a stored time step
    fn load_time_step(&mut self, file_index: usize) -> Result<()>;
}
