//! In-memory simulation document
//!
//! `MemoryDocument` stores a complete model snapshot (mesh, element states,
//! selections and time stepping state) and implements all the document
//! traits. Snapshots can be read from and written to json files.
use crate::{
    Dim, Error, MeshDocument, Param, Result, SelectionDocument, SelectionType,
    SimulationDocument,
};
use chrono::NaiveDateTime;
use log::debug;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Write};

/// Named selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedSelection {
    pub sel_type: SelectionType,
    pub name: String,
    pub items: Vec<usize>,
}

/// Time stepping state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationState {
    pub time: f64,
    pub final_time: f64,
    pub dt: f64,
    #[serde(default)]
    pub reference_time: Option<NaiveDateTime>,
    /// Stored time steps as `(file_index, simulation_time)`
    #[serde(default)]
    pub time_steps: Vec<(usize, f64)>,
    #[serde(default)]
    pub loaded: Option<usize>,
    #[serde(default)]
    pub stopped: bool,
}

/// Model snapshot held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    dim: Dim,
    /// Local node coordinates (z = 0 in 2d)
    coords: Vec<[f64; 3]>,
    elems: Vec<Vec<usize>>,
    /// Number of layers, 0 for 2d models
    #[serde(default)]
    n_layers: usize,
    #[serde(default)]
    origin: [f64; 2],
    #[serde(default)]
    inactive: FxHashSet<usize>,
    #[serde(default)]
    selections: Vec<NamedSelection>,
    #[serde(default)]
    simulation: SimulationState,
}

impl MemoryDocument {
    /// Create a 2d model from local node coordinates and element connectivities
    #[must_use]
    pub fn new_2d(coords: &[[f64; 2]], elems: Vec<Vec<usize>>) -> Self {
        Self {
            dim: 2,
            coords: coords.iter().map(|&[x, y]| [x, y, 0.0]).collect(),
            elems,
            ..Self::default()
        }
    }

    /// Create a layered 3d model by extruding a 2d mesh through the slice
    /// elevations `z` (top slice first).
    ///
    /// Nodes are numbered slice by slice. The element of layer `k` built on the
    /// 2d element `e` lists the nodes of `e` in slice `k` followed by the nodes
    /// of `e` in slice `k + 1`; elements are numbered layer by layer.
    #[must_use]
    pub fn layered(coords: &[[f64; 2]], elems: &[Vec<usize>], z: &[f64]) -> Self {
        assert!(z.len() > 1, "at least 2 slices are required");
        let n = coords.len();
        let coords = z
            .iter()
            .flat_map(move |&z| coords.iter().map(move |&[x, y]| [x, y, z]))
            .collect();
        let n_layers = z.len() - 1;
        let elems = (0..n_layers)
            .flat_map(move |k| {
                elems.iter().map(move |e| {
                    e.iter()
                        .map(|&i| i + k * n)
                        .chain(e.iter().map(|&i| i + (k + 1) * n))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        Self {
            dim: 3,
            coords,
            elems,
            n_layers,
            ..Self::default()
        }
    }

    /// Set the origin of the local coordinate system
    #[must_use]
    pub const fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = [x, y];
        self
    }

    /// Set the time stepping parameters
    #[must_use]
    pub fn with_simulation(mut self, final_time: f64, dt: f64) -> Self {
        self.simulation.final_time = final_time;
        self.simulation.dt = dt;
        self
    }

    /// Set the reference calendar time
    #[must_use]
    pub const fn with_reference_time(mut self, t: NaiveDateTime) -> Self {
        self.simulation.reference_time = Some(t);
        self
    }

    /// Set the time steps available in the results file
    #[must_use]
    pub fn with_time_steps(mut self, time_steps: Vec<(usize, f64)>) -> Self {
        self.simulation.time_steps = time_steps;
        self
    }

    /// Activate or deactivate an element
    pub fn set_elem_active(&mut self, elem: usize, active: bool) -> Result<()> {
        self.check_elem(elem)?;
        if active {
            self.inactive.remove(&elem);
        } else {
            self.inactive.insert(elem);
        }
        Ok(())
    }

    /// Time stepping state
    #[must_use]
    pub const fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    /// Read a snapshot from a json file
    pub fn from_json(fname: &str) -> Result<Self> {
        let file = File::open(fname)?;
        let res: Self = serde_json::from_reader(file)?;
        res.check()?;
        debug!(
            "Read {fname}: {} nodes, {} elements",
            res.coords.len(),
            res.elems.len()
        );
        Ok(res)
    }

    /// Write the snapshot to a json file
    pub fn to_json(&self, fname: &str) -> Result<()> {
        let mut file = File::create(fname)?;
        writeln!(file, "{}", serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check the consistency of the snapshot
    pub fn check(&self) -> Result<()> {
        if self.dim != 2 && self.dim != 3 {
            return Err(Error::document(&format!("invalid dimension {}", self.dim)));
        }
        if self.dim == 3 && self.n_layers == 0 {
            return Err(Error::document("3d models need at least one layer"));
        }
        let n = self.coords.len();
        if self.elems.iter().flatten().any(|&i| i >= n) {
            return Err(Error::document("invalid node index in elements"));
        }
        Ok(())
    }

    fn check_elem(&self, elem: usize) -> Result<()> {
        if elem < self.elems.len() {
            Ok(())
        } else {
            Err(Error::document(&format!("invalid element index {elem}")))
        }
    }

    fn coord(&self, node: usize, i: usize) -> Result<f64> {
        self.coords
            .get(node)
            .map(|p| p[i])
            .ok_or_else(|| Error::document(&format!("invalid node index {node}")))
    }

    fn selections_of(&self, sel_type: SelectionType) -> impl Iterator<Item = &NamedSelection> {
        self.selections.iter().filter(move |s| s.sel_type == sel_type)
    }

    fn selection_mut(&mut self, sel_type: SelectionType, id: usize) -> Result<&mut NamedSelection> {
        self.selections
            .iter_mut()
            .filter(|s| s.sel_type == sel_type)
            .nth(id)
            .ok_or_else(|| Error::document(&format!("invalid {sel_type} selection id {id}")))
    }
}

impl MeshDocument for MemoryDocument {
    fn n_dims(&self) -> Dim {
        self.dim
    }

    fn n_nodes(&self) -> usize {
        self.coords.len()
    }

    fn n_elems(&self) -> usize {
        self.elems.len()
    }

    fn n_nodes_per_slice(&self) -> usize {
        if self.n_layers == 0 {
            self.coords.len()
        } else {
            self.coords.len() / (self.n_layers + 1)
        }
    }

    fn n_elems_per_layer(&self) -> usize {
        if self.n_layers == 0 {
            self.elems.len()
        } else {
            self.elems.len() / self.n_layers
        }
    }

    fn n_elem_nodes(&self, elem: usize) -> Result<usize> {
        self.check_elem(elem)?;
        Ok(self.elems[elem].len())
    }

    fn node(&self, elem: usize, i: usize) -> Result<usize> {
        self.check_elem(elem)?;
        self.elems[elem]
            .get(i)
            .copied()
            .ok_or_else(|| Error::document(&format!("element {elem} has no node {i}")))
    }

    fn n_node_elems(&self, node: usize) -> Result<usize> {
        self.coord(node, 0)?;
        Ok(self.elems.iter().filter(|e| e.contains(&node)).count())
    }

    fn node_elem(&self, node: usize, i: usize) -> Result<usize> {
        self.coord(node, 0)?;
        self.elems
            .iter()
            .enumerate()
            .filter(|(_, e)| e.contains(&node))
            .nth(i)
            .map(|(elem, _)| elem)
            .ok_or_else(|| Error::document(&format!("node {node} has no element {i}")))
    }

    fn x(&self, node: usize) -> Result<f64> {
        self.coord(node, 0)
    }

    fn y(&self, node: usize) -> Result<f64> {
        self.coord(node, 1)
    }

    fn z(&self, node: usize) -> Result<f64> {
        self.coord(node, 2)
    }

    fn origin_x(&self) -> f64 {
        self.origin[0]
    }

    fn origin_y(&self) -> f64 {
        self.origin[1]
    }

    fn is_elem_active(&self, elem: usize) -> Result<bool> {
        self.check_elem(elem)?;
        Ok(!self.inactive.contains(&elem))
    }

    fn param_values(&self, param: Param) -> Result<Vec<f64>> {
        let i = match param {
            Param::MeshX => 0,
            Param::MeshY => 1,
            Param::MeshZ => 2,
        };
        Ok(self.coords.iter().map(|p| p[i]).collect())
    }
}

impl SelectionDocument for MemoryDocument {
    fn n_selections(&self, sel_type: SelectionType) -> usize {
        self.selections_of(sel_type).count()
    }

    fn find_selection(&self, sel_type: SelectionType, name: &str) -> Option<usize> {
        self.selections_of(sel_type).position(|s| s.name == name)
    }

    fn selection_name(&self, sel_type: SelectionType, id: usize) -> Result<String> {
        self.selections_of(sel_type)
            .nth(id)
            .map(|s| s.name.clone())
            .ok_or_else(|| Error::document(&format!("invalid {sel_type} selection id {id}")))
    }

    fn selection_items(&self, sel_type: SelectionType, id: usize) -> Result<Vec<usize>> {
        self.selections_of(sel_type)
            .nth(id)
            .map(|s| s.items.clone())
            .ok_or_else(|| Error::document(&format!("invalid {sel_type} selection id {id}")))
    }

    fn create_selection(&mut self, sel_type: SelectionType, name: &str) -> Result<usize> {
        if sel_type == SelectionType::Invalid {
            return Err(Error::document("cannot create a selection of invalid type"));
        }
        if self.find_selection(sel_type, name).is_some() {
            return Err(Error::document(&format!("selection {name} already exists")));
        }
        self.selections.push(NamedSelection {
            sel_type,
            name: name.into(),
            items: Vec::new(),
        });
        Ok(self.n_selections(sel_type) - 1)
    }

    fn set_selection_item(
        &mut self,
        sel_type: SelectionType,
        id: usize,
        item: usize,
    ) -> Result<()> {
        let sel = self.selection_mut(sel_type, id)?;
        if !sel.items.contains(&item) {
            sel.items.push(item);
        }
        Ok(())
    }

    fn clear_selection_item(
        &mut self,
        sel_type: SelectionType,
        id: usize,
        item: usize,
    ) -> Result<()> {
        let sel = self.selection_mut(sel_type, id)?;
        sel.items.retain(|&i| i != item);
        Ok(())
    }
}

impl SimulationDocument for MemoryDocument {
    fn absolute_time(&self) -> f64 {
        self.simulation.time
    }

    fn final_time(&self) -> f64 {
        self.simulation.final_time
    }

    fn time_increment(&self) -> f64 {
        self.simulation.dt
    }

    fn reference_time(&self) -> Option<NaiveDateTime> {
        self.simulation.reference_time
    }

    fn single_step(&mut self) -> Result<()> {
        if self.simulation.stopped {
            return Err(Error::document("the simulator is stopped"));
        }
        if self.simulation.dt <= 0.0 {
            return Err(Error::document("invalid time increment"));
        }
        let sim = &mut self.simulation;
        sim.time = f64::min(sim.time + sim.dt, sim.final_time);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.simulation.stopped = true;
        Ok(())
    }

    fn stored_time_steps(&self) -> Result<Vec<(usize, f64)>> {
        Ok(self.simulation.time_steps.clone())
    }

    fn load_time_step(&mut self, file_index: usize) -> Result<()> {
        let &(_, t) = self
            .simulation
            .time_steps
            .iter()
            .find(|(i, _)| *i == file_index)
            .ok_or_else(|| Error::document(&format!("no time step {file_index}")))?;
        self.simulation.loaded = Some(file_index);
        self.simulation.time = t;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryDocument;
    use crate::{MeshDocument, Result, SelectionDocument, SelectionType};
    use tempfile::NamedTempFile;

    fn square() -> MemoryDocument {
        MemoryDocument::new_2d(
            &[[0., 0.], [1., 0.], [0., 1.], [1., 1.]],
            vec![vec![0, 1, 3, 2]],
        )
    }

    #[test]
    fn test_layered() {
        let doc = MemoryDocument::layered(
            &[[0., 0.], [1., 0.], [0., 1.]],
            &[vec![0, 1, 2]],
            &[0., -1., -3.],
        );
        assert_eq!(doc.n_dims(), 3);
        assert_eq!(doc.n_nodes(), 9);
        assert_eq!(doc.n_nodes_per_slice(), 3);
        assert_eq!(doc.n_elems(), 2);
        assert_eq!(doc.n_elems_per_layer(), 1);
        assert_eq!(doc.elems[1], vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(doc.z(7).unwrap(), -3.);
        assert_eq!(doc.n_node_elems(4).unwrap(), 2);
        assert_eq!(doc.node_elem(4, 1).unwrap(), 1);
    }

    #[test]
    fn test_invalid_indices() {
        let doc = square();
        assert!(doc.node(1, 0).is_err());
        assert!(doc.node(0, 4).is_err());
        assert!(doc.x(4).is_err());
        assert!(doc.is_elem_active(3).is_err());
    }

    #[test]
    fn test_json() -> Result<()> {
        let mut doc = square().with_origin(100.0, 200.0);
        doc.set_elem_active(0, false)?;
        let id = doc.create_selection(SelectionType::Nodal, "corner")?;
        doc.set_selection_item(SelectionType::Nodal, id, 3)?;

        let file = NamedTempFile::new().unwrap();
        let fname = file.path().to_str().unwrap().to_owned() + ".json";
        doc.to_json(&fname)?;

        let doc2 = MemoryDocument::from_json(&fname)?;
        assert_eq!(doc2.n_nodes(), 4);
        assert_eq!(doc2.n_elem_nodes(0)?, 4);
        assert!(!doc2.is_elem_active(0)?);
        assert_eq!(doc2.origin_x(), 100.0);
        assert_eq!(doc2.find_selection(SelectionType::Nodal, "corner"), Some(0));
        assert_eq!(doc2.selection_items(SelectionType::Nodal, 0)?, vec![3]);

        Ok(())
    }

    #[test]
    fn test_check() {
        let doc = MemoryDocument::new_2d(&[[0., 0.], [1., 0.]], vec![vec![0, 1, 2]]);
        assert!(doc.check().is_err());
    }
}
