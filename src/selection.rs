//! Named selections of nodes, elements, edges and fractures
use crate::{Error, MeshAccessor, MeshDocument, Result, SelectionDocument, SelectionType};
use log::{debug, warn};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// Selection helpers on a document
pub struct Selections<'a, D: SelectionDocument + MeshDocument> {
    doc: &'a mut D,
}

/// Types to search: the given one, or all the supported ones
fn search_types(sel_type: Option<SelectionType>) -> Vec<SelectionType> {
    sel_type.map_or_else(|| SelectionType::SEARCH_ORDER.to_vec(), |t| vec![t])
}

impl<'a, D: SelectionDocument + MeshDocument> Selections<'a, D> {
    #[must_use]
    pub const fn new(doc: &'a mut D) -> Self {
        Self { doc }
    }

    /// Find a selection by name, returning its type and id
    fn find(&self, name: &str, sel_type: Option<SelectionType>) -> Option<(SelectionType, usize)> {
        search_types(sel_type)
            .into_iter()
            .find_map(|t| self.doc.find_selection(t, name).map(|id| (t, id)))
    }

    /// Items of a selection. If `sel_type` is `None`, all the supported types
    /// are searched and the first match is used
    pub fn list(&self, name: &str, sel_type: Option<SelectionType>) -> Result<Vec<usize>> {
        let (t, id) = self
            .find(name, sel_type)
            .ok_or_else(|| Error::value(&format!("Selection {name} not found")))?;
        self.doc.selection_items(t, id)
    }

    /// Items of a selection, as a set
    pub fn set(&self, name: &str, sel_type: Option<SelectionType>) -> Result<FxHashSet<usize>> {
        Ok(self.list(name, sel_type)?.into_iter().collect())
    }

    /// Names of the selections of a given type, or of all the supported types
    pub fn names(&self, sel_type: Option<SelectionType>) -> Result<Vec<String>> {
        let mut res = Vec::new();
        for t in search_types(sel_type) {
            for id in 0..self.doc.n_selections(t) {
                res.push(self.doc.selection_name(t, id)?);
            }
        }
        Ok(res)
    }

    /// Type of a selection, `SelectionType::Invalid` if there is none with this name
    #[must_use]
    pub fn selection_type(&self, name: &str) -> SelectionType {
        self.find(name, None)
            .map_or(SelectionType::Invalid, |(t, _)| t)
    }

    /// Create a new selection, optionally filled with `items`, and return its id.
    ///
    /// An existing selection with the same name and type is an error unless
    /// `overwrite_existing` is set, in which case it is emptied and reused.
    pub fn create(
        &mut self,
        sel_type: SelectionType,
        name: &str,
        items: Option<&[usize]>,
        overwrite_existing: bool,
    ) -> Result<usize> {
        let id = match self.doc.find_selection(sel_type, name) {
            None => self.doc.create_selection(sel_type, name)?,
            Some(id) if overwrite_existing => {
                debug!("Overwrite selection {name}");
                self.clear_items(sel_type, id)?;
                id
            }
            Some(_) => {
                return Err(Error::value(&format!(
                    "Selection {name} does already exist!"
                )));
            }
        };

        if let Some(items) = items {
            for &i in items {
                self.doc.set_selection_item(sel_type, id, i)?;
            }
        }

        Ok(id)
    }

    /// Convert a selection to another type. Supported conversions are
    /// elemental to nodal (nodes of the selected elements) and nodal to
    /// elemental (elements containing a selected node); the result is sorted
    pub fn convert(&self, name: &str, to_type: SelectionType) -> Result<Vec<usize>> {
        let from_type = self.selection_type(name);

        if from_type == SelectionType::Invalid {
            return Err(Error::value(&format!("Selection {name} not found")));
        }
        if to_type == SelectionType::Invalid {
            return Err(Error::value("Cannot convert to Invalid Type!"));
        }

        if from_type == to_type {
            return self.list(name, Some(from_type));
        }

        match (from_type, to_type) {
            (SelectionType::Elemental, SelectionType::Nodal) => {
                let imat = MeshAccessor::new(&*self.doc).incidence_matrix(false, false)?;
                let mut res = BTreeSet::new();
                for e in self.list(name, Some(from_type))? {
                    let nodes = imat
                        .get(e)
                        .ok_or_else(|| Error::document(&format!("invalid element index {e}")))?;
                    res.extend(nodes.iter().copied());
                }
                Ok(res.into_iter().collect())
            }
            (SelectionType::Nodal, SelectionType::Elemental) => {
                let mut res = BTreeSet::new();
                for n in self.list(name, Some(from_type))? {
                    for i in 0..self.doc.n_node_elems(n)? {
                        res.insert(self.doc.node_elem(n, i)?);
                    }
                }
                Ok(res.into_iter().collect())
            }
            _ => Err(Error::not_implemented(&format!(
                "conversion from {from_type} to {to_type}"
            ))),
        }
    }

    fn clear_items(&mut self, sel_type: SelectionType, id: usize) -> Result<()> {
        for i in self.doc.selection_items(sel_type, id)? {
            self.doc.clear_selection_item(sel_type, id, i)?;
        }
        Ok(())
    }

    /// Remove all the items of a selection
    pub fn clear(&mut self, name: &str, sel_type: Option<SelectionType>) -> Result<()> {
        let (t, id) = self.find(name, sel_type).ok_or_else(|| {
            warn!("Cannot clear selection {name}");
            Error::runtime(&format!("selection '{name}' not found in model"))
        })?;
        self.clear_items(t, id)
    }

    /// Replace the items of a selection
    pub fn update(
        &mut self,
        name: &str,
        items: &[usize],
        sel_type: Option<SelectionType>,
    ) -> Result<()> {
        let (t, id) = self.find(name, sel_type).ok_or_else(|| {
            warn!("Cannot update selection {name}");
            Error::runtime(&format!("selection '{name}' not found in model"))
        })?;
        self.clear_items(t, id)?;
        for &i in items {
            self.doc.set_selection_item(t, id, i)?;
        }
        Ok(())
    }
}
