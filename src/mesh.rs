//! Topology and geometry queries on the mesh of a simulation document
use crate::{Error, MeshDocument, Param, Result, SelectionType};
use log::debug;
use serde::Serialize;

/// Split a 4-noded element into 2 triangles sharing the edge (1, 2)
const QUA_TO_TRIS: [[usize; 3]; 2] = [[0, 1, 2], [1, 2, 3]];

/// Split an 8-noded prism into 2 6-noded prisms
const HEX_TO_PRIS: [[usize; 6]; 2] = [[0, 1, 2, 4, 5, 6], [1, 2, 3, 4, 6, 7]];

fn pick<const N: usize>(nodes: &[usize], idx: &[usize; N]) -> Vec<usize> {
    idx.iter().map(|&i| nodes[i]).collect()
}

/// Parameters for `MeshAccessor::incidence_matrix_with_coordinates`
#[derive(Debug, Clone)]
pub struct ArrayParams {
    /// Use the global coordinate system (local + origin)
    pub global_cos: bool,
    /// Split 4-noded elements into triangles
    pub split_quads_to_triangles: bool,
    /// Restrict a layered 3d model to a single layer
    pub layer: Option<usize>,
    /// Skip the inactive elements
    pub ignore_inactive: bool,
    /// Project a layered 3d model to 2d
    pub as_2d: bool,
}

impl Default for ArrayParams {
    fn default() -> Self {
        Self {
            global_cos: true,
            split_quads_to_triangles: false,
            layer: None,
            ignore_inactive: false,
            as_2d: false,
        }
    }
}

/// Node coordinates and incidence matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshArrays {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub imat: Vec<Vec<usize>>,
}

/// Element centroid; `z` is `None` for 2d models
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// Read-only mesh queries on a document
pub struct MeshAccessor<'a, D: MeshDocument> {
    doc: &'a D,
}

impl<'a, D: MeshDocument> MeshAccessor<'a, D> {
    #[must_use]
    pub const fn new(doc: &'a D) -> Self {
        Self { doc }
    }

    fn elem_nodes(&self, elem: usize, n: usize) -> Result<Vec<usize>> {
        (0..n).map(|i| self.doc.node(elem, i)).collect()
    }

    /// Node indices of every element, in element order.
    ///
    /// With `split_quads_to_triangles`, 4-noded elements are split into 2
    /// triangles and 8-noded prisms into 2 6-noded prisms; 3- and 6-noded
    /// elements are kept. Other elements cannot be split and yield an error.
    pub fn incidence_matrix(
        &self,
        split_quads_to_triangles: bool,
        ignore_inactive: bool,
    ) -> Result<Vec<Vec<usize>>> {
        let n_elems = self.doc.n_elems();
        let mut imat = Vec::with_capacity(n_elems);

        for elem in 0..n_elems {
            if ignore_inactive && !self.doc.is_elem_active(elem)? {
                continue;
            }

            let n = self.doc.n_elem_nodes(elem)?;
            let nodes = self.elem_nodes(elem, n)?;

            if split_quads_to_triangles {
                match n {
                    3 | 6 => imat.push(nodes),
                    4 => imat.extend(QUA_TO_TRIS.iter().map(|idx| pick(&nodes, idx))),
                    8 => imat.extend(HEX_TO_PRIS.iter().map(|idx| pick(&nodes, idx))),
                    _ => {
                        return Err(Error::value(&format!(
                            "{n}-noded element not supported"
                        )));
                    }
                }
            } else {
                imat.push(nodes);
            }
        }
        debug!("Incidence matrix: {} elements -> {} groups", n_elems, imat.len());

        Ok(imat)
    }

    /// Node x and y coordinates together with the incidence matrix.
    ///
    /// For layered 3d models, `layer` or `as_2d` restrict the output to a single
    /// slice: only the first half of the nodes of each element (the nodes of
    /// the top slice) are used. Only 3- and 4-noded (per slice) elements can be
    /// split.
    pub fn incidence_matrix_with_coordinates(&self, params: &ArrayParams) -> Result<MeshArrays> {
        let (n_nodes, n_elems, stride) = if self.doc.n_dims() == 2 {
            (self.doc.n_nodes_per_slice(), self.doc.n_elems_per_layer(), 1)
        } else if params.layer.is_some() || params.as_2d {
            (self.doc.n_nodes_per_slice(), self.doc.n_elems_per_layer(), 2)
        } else {
            (self.doc.n_nodes(), self.doc.n_elems(), 1)
        };
        debug!("Mesh arrays: {n_nodes} nodes, {n_elems} elements, stride {stride}");

        let (x0, y0) = if params.global_cos {
            (self.doc.origin_x(), self.doc.origin_y())
        } else {
            (0.0, 0.0)
        };

        let x = self
            .doc
            .param_values(Param::MeshX)?
            .into_iter()
            .take(n_nodes)
            .map(|x| x + x0)
            .collect();
        let y = self
            .doc
            .param_values(Param::MeshY)?
            .into_iter()
            .take(n_nodes)
            .map(|y| y + y0)
            .collect();

        let mut imat = Vec::with_capacity(n_elems);
        for elem in 0..n_elems {
            if params.ignore_inactive && !self.doc.is_elem_active(elem)? {
                continue;
            }

            let n_raw = self.doc.n_elem_nodes(elem)?;
            if n_raw % stride != 0 {
                return Err(Error::value(&format!(
                    "{n_raw}-noded element cannot be split in {stride} slices"
                )));
            }
            let n = n_raw / stride;
            let nodes = self.elem_nodes(elem, n)?;

            if params.split_quads_to_triangles {
                match n {
                    3 => imat.push(nodes),
                    4 => imat.extend(QUA_TO_TRIS.iter().map(|idx| pick(&nodes, idx))),
                    _ => {
                        return Err(Error::value(&format!(
                            "{}-noded element not supported",
                            n * 2
                        )));
                    }
                }
            } else {
                imat.push(nodes);
            }
        }

        Ok(MeshArrays { x, y, imat })
    }

    /// Centroid of an element, as the mean of its node coordinates.
    ///
    /// The global coordinate system is used unless `local_cos` is set; the
    /// origin only shifts x and y. Only elemental items are supported.
    pub fn element_centroid(
        &self,
        elem: usize,
        local_cos: bool,
        item_type: SelectionType,
    ) -> Result<Centroid> {
        if item_type != SelectionType::Elemental {
            return Err(Error::not_implemented(&format!(
                "function not implemented for itemtype {item_type}"
            )));
        }

        let is_3d = self.doc.n_dims() == 3;
        let n = self.doc.n_elem_nodes(elem)?;

        let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let node = self.doc.node(elem, i)?;
            x += self.doc.x(node)?;
            y += self.doc.y(node)?;
            if is_3d {
                z += self.doc.z(node)?;
            }
        }

        let n = n as f64;
        let mut res = Centroid {
            x: x / n,
            y: y / n,
            z: is_3d.then_some(z / n),
        };

        if !local_cos {
            res.x += self.doc.origin_x();
            res.y += self.doc.origin_y();
        }

        Ok(res)
    }

    /// Centroids of all the elements, in element order
    pub fn element_centroids(&self, local_cos: bool, ignore_inactive: bool) -> Result<Vec<Centroid>> {
        let mut res = Vec::with_capacity(self.doc.n_elems());
        for elem in 0..self.doc.n_elems() {
            if ignore_inactive && !self.doc.is_elem_active(elem)? {
                continue;
            }
            res.push(self.element_centroid(elem, local_cos, SelectionType::Elemental)?);
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::{ArrayParams, MeshAccessor};
    use crate::{Error, MemoryDocument, Result, SelectionType, assert_delta};

    /// Single element whose nodes are `0..n`, placed on a circle
    fn single_elem(n: usize) -> MemoryDocument {
        let coords = (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                [t.cos(), t.sin()]
            })
            .collect::<Vec<_>>();
        MemoryDocument::new_2d(&coords, vec![(0..n).collect()])
    }

    /// 3 quadrangles in a row and 1 triangle
    fn mixed_2d() -> MemoryDocument {
        let coords = [
            [0., 0.],
            [1., 0.],
            [2., 0.],
            [3., 0.],
            [0., 1.],
            [1., 1.],
            [2., 1.],
            [3., 1.],
            [4., 0.],
        ];
        let elems = vec![
            vec![0, 1, 4, 5],
            vec![1, 2, 5, 6],
            vec![2, 3, 6, 7],
            vec![3, 8, 7],
        ];
        MemoryDocument::new_2d(&coords, elems)
    }

    #[test]
    fn test_no_split() -> Result<()> {
        let doc = mixed_2d();
        let imat = MeshAccessor::new(&doc).incidence_matrix(false, false)?;
        assert_eq!(
            imat,
            vec![
                vec![0, 1, 4, 5],
                vec![1, 2, 5, 6],
                vec![2, 3, 6, 7],
                vec![3, 8, 7]
            ]
        );
        Ok(())
    }

    #[test]
    fn test_split_triangles() -> Result<()> {
        for n in [3, 6] {
            let doc = single_elem(n);
            let imat = MeshAccessor::new(&doc).incidence_matrix(true, false)?;
            assert_eq!(imat, vec![(0..n).collect::<Vec<_>>()]);
        }
        Ok(())
    }

    #[test]
    fn test_split_quad() -> Result<()> {
        let coords = (0..14).map(|i| [f64::from(i), 0.0]).collect::<Vec<_>>();
        let doc = MemoryDocument::new_2d(&coords, vec![vec![10, 11, 12, 13]]);
        let imat = MeshAccessor::new(&doc).incidence_matrix(true, false)?;
        assert_eq!(imat, vec![vec![10, 11, 12], vec![11, 12, 13]]);
        Ok(())
    }

    #[test]
    fn test_split_prism() -> Result<()> {
        let doc = single_elem(8);
        let imat = MeshAccessor::new(&doc).incidence_matrix(true, false)?;
        assert_eq!(imat, vec![vec![0, 1, 2, 4, 5, 6], vec![1, 2, 3, 4, 6, 7]]);
        Ok(())
    }

    #[test]
    fn test_split_unsupported() -> Result<()> {
        for n in [2, 5, 7, 9] {
            let doc = single_elem(n);
            let msh = MeshAccessor::new(&doc);
            match msh.incidence_matrix(true, false) {
                Err(Error::Value(msg)) => assert_eq!(msg, format!("{n}-noded element not supported")),
                other => panic!("unexpected result {other:?}"),
            }
            assert_eq!(msh.incidence_matrix(false, false)?, vec![(0..n).collect::<Vec<_>>()]);
        }
        Ok(())
    }

    #[test]
    fn test_ignore_inactive() -> Result<()> {
        let mut doc = mixed_2d();
        doc.set_elem_active(1, false)?;
        let msh = MeshAccessor::new(&doc);

        let imat = msh.incidence_matrix(false, true)?;
        assert_eq!(imat, vec![vec![0, 1, 4, 5], vec![2, 3, 6, 7], vec![3, 8, 7]]);

        let imat = msh.incidence_matrix(true, true)?;
        assert_eq!(
            imat,
            vec![
                vec![0, 1, 4],
                vec![1, 4, 5],
                vec![2, 3, 6],
                vec![3, 6, 7],
                vec![3, 8, 7]
            ]
        );

        let arrays = msh.incidence_matrix_with_coordinates(&ArrayParams {
            ignore_inactive: true,
            ..ArrayParams::default()
        })?;
        assert_eq!(arrays.imat.len(), 3);
        assert!(!arrays.imat.contains(&vec![1, 2, 5, 6]));

        let centroids = msh.element_centroids(true, true)?;
        assert_eq!(centroids.len(), 3);
        assert_delta!(centroids[1].x, 2.5, 1e-12);

        Ok(())
    }

    #[test]
    fn test_arrays_2d() -> Result<()> {
        let doc = mixed_2d().with_origin(1000.0, -50.0);
        let msh = MeshAccessor::new(&doc);

        let arrays = msh.incidence_matrix_with_coordinates(&ArrayParams::default())?;
        assert_eq!(arrays.x.len(), 9);
        assert_eq!(arrays.y.len(), 9);
        assert_delta!(arrays.x[3], 1003.0, 1e-12);
        assert_delta!(arrays.y[4], -49.0, 1e-12);
        assert_eq!(arrays.imat.len(), 4);

        let arrays = msh.incidence_matrix_with_coordinates(&ArrayParams {
            global_cos: false,
            split_quads_to_triangles: true,
            ..ArrayParams::default()
        })?;
        assert_delta!(arrays.x[3], 3.0, 1e-12);
        assert_delta!(arrays.y[4], 1.0, 1e-12);
        assert_eq!(arrays.imat.len(), 7);
        assert_eq!(arrays.imat[0], vec![0, 1, 4]);
        assert_eq!(arrays.imat[1], vec![1, 4, 5]);
        assert_eq!(arrays.imat[6], vec![3, 8, 7]);

        Ok(())
    }

    #[test]
    fn test_arrays_2d_unsupported() {
        let doc = single_elem(6);
        let res = MeshAccessor::new(&doc).incidence_matrix_with_coordinates(&ArrayParams {
            split_quads_to_triangles: true,
            ..ArrayParams::default()
        });
        match res {
            Err(Error::Value(msg)) => assert_eq!(msg, "12-noded element not supported"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_arrays_3d_full_unsupported() {
        let doc = MemoryDocument::layered(
            &[[0., 0.], [1., 0.], [0., 1.], [1., 1.]],
            &[vec![0, 1, 3, 2]],
            &[0., -1.],
        );
        let res = MeshAccessor::new(&doc).incidence_matrix_with_coordinates(&ArrayParams {
            split_quads_to_triangles: true,
            ..ArrayParams::default()
        });
        match res {
            Err(Error::Value(msg)) => assert_eq!(msg, "16-noded element not supported"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    fn layered() -> MemoryDocument {
        MemoryDocument::layered(
            &[[0., 0.], [1., 0.], [0., 1.], [1., 1.]],
            &[vec![0, 1, 3, 2]],
            &[0., -1., -2.],
        )
        .with_origin(10.0, 20.0)
    }

    #[test]
    fn test_arrays_3d() -> Result<()> {
        let doc = layered();
        let msh = MeshAccessor::new(&doc);

        let arrays = msh.incidence_matrix_with_coordinates(&ArrayParams::default())?;
        assert_eq!(arrays.x.len(), 12);
        assert_eq!(arrays.imat.len(), 2);
        assert_eq!(arrays.imat[1], vec![4, 5, 7, 6, 8, 9, 11, 10]);

        for params in [
            ArrayParams {
                layer: Some(0),
                ..ArrayParams::default()
            },
            ArrayParams {
                as_2d: true,
                ..ArrayParams::default()
            },
        ] {
            let arrays = msh.incidence_matrix_with_coordinates(&params)?;
            assert_eq!(arrays.x.len(), 4);
            assert_delta!(arrays.x[1], 11.0, 1e-12);
            assert_delta!(arrays.y[2], 21.0, 1e-12);
            assert_eq!(arrays.imat, vec![vec![0, 1, 3, 2]]);
        }

        let arrays = msh.incidence_matrix_with_coordinates(&ArrayParams {
            as_2d: true,
            split_quads_to_triangles: true,
            ..ArrayParams::default()
        })?;
        assert_eq!(arrays.imat, vec![vec![0, 1, 3], vec![1, 3, 2]]);

        Ok(())
    }

    #[test]
    fn test_arrays_3d_unsupported() {
        let doc = MemoryDocument::layered(
            &[[0., 0.], [1., 0.], [2., 0.], [2., 1.], [0., 1.]],
            &[vec![0, 1, 2, 3, 4]],
            &[0., -1.],
        );
        let res = MeshAccessor::new(&doc).incidence_matrix_with_coordinates(&ArrayParams {
            as_2d: true,
            split_quads_to_triangles: true,
            ..ArrayParams::default()
        });
        match res {
            Err(Error::Value(msg)) => assert_eq!(msg, "10-noded element not supported"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_arrays_3d_odd_nodes() {
        let coords = (0..5).map(|i| [f64::from(i), 0.0]).collect::<Vec<_>>();
        let mut doc = MemoryDocument::layered(&coords, &[vec![0, 1, 2]], &[0., -1.]);
        // 3d model with an element that does not span 2 slices
        let mut json = serde_json::to_value(&doc).unwrap();
        json["elems"][0] = serde_json::json!([0, 1, 2, 5, 6]);
        doc = serde_json::from_value(json).unwrap();

        let res = MeshAccessor::new(&doc).incidence_matrix_with_coordinates(&ArrayParams {
            layer: Some(0),
            ..ArrayParams::default()
        });
        assert!(matches!(res, Err(Error::Value(_))));
    }

    #[test]
    fn test_centroid_2d() -> Result<()> {
        let doc = MemoryDocument::new_2d(&[[0., 0.], [2., 0.], [0., 2.]], vec![vec![0, 1, 2]])
            .with_origin(5000.0, 7000.0);
        let msh = MeshAccessor::new(&doc);

        let c = msh.element_centroid(0, true, SelectionType::Elemental)?;
        assert_delta!(c.x, 0.667, 1e-3);
        assert_delta!(c.y, 0.667, 1e-3);
        assert!(c.z.is_none());

        let g = msh.element_centroid(0, false, SelectionType::Elemental)?;
        assert_eq!(g.x, c.x + 5000.0);
        assert_eq!(g.y, c.y + 7000.0);
        assert!(g.z.is_none());

        Ok(())
    }

    #[test]
    fn test_centroid_3d() -> Result<()> {
        let doc = layered();
        let msh = MeshAccessor::new(&doc);

        let c = msh.element_centroid(1, true, SelectionType::Elemental)?;
        assert_delta!(c.x, 0.5, 1e-12);
        assert_delta!(c.y, 0.5, 1e-12);
        assert_delta!(c.z.unwrap(), -1.5, 1e-12);

        let g = msh.element_centroid(1, false, SelectionType::Elemental)?;
        assert_delta!(g.x, 10.5, 1e-12);
        assert_delta!(g.y, 20.5, 1e-12);
        assert_eq!(g.z, c.z);

        Ok(())
    }

    #[test]
    fn test_centroid_not_elemental() {
        let doc = mixed_2d();
        let msh = MeshAccessor::new(&doc);
        for item_type in [
            SelectionType::Nodal,
            SelectionType::Edges,
            SelectionType::Faces,
            SelectionType::Fracs,
            SelectionType::Invalid,
        ] {
            // invalid element index: the type is checked before the document is read
            let res = msh.element_centroid(100, true, item_type);
            match res {
                Err(Error::NotImplemented(msg)) => assert!(msg.ends_with(&item_type.to_string())),
                other => panic!("unexpected result {other:?}"),
            }
        }
        assert!(matches!(
            msh.element_centroid(100, true, SelectionType::Elemental),
            Err(Error::Document(_))
        ));
    }
}
