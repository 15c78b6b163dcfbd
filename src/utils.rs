#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::optimization::root_finder::{LineSearcher, RootOptions, Tolerances};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 1-D array-like into an owned `Array1`.
#[cfg(feature = "python-bindings")]
pub fn extract_vector<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence"))
    })?;
    Ok(Array1::from(slice.to_vec()))
}

/// Copy a 2-D array-like (NumPy array or nested sequence) into an owned
/// `Array2`.
#[cfg(feature = "python-bindings")]
pub fn extract_matrix<'py>(
    raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }
    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(format!(
            "{name} must be a 2-D numpy.ndarray or a sequence of float64 sequences"
        ))
    })?;
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err(format!("{name} rows must all have the same length")));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PyValueError::new_err(format!("{name}: {e}")))
}

/// Build price-solver options from optional Python keyword arguments.
#[cfg(feature = "python-bindings")]
pub fn extract_root_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    tol_residual: Option<f64>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<RootOptions> {
    use std::str::FromStr;

    let defaults = RootOptions::default();
    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        tol_cost.or(defaults.tols.tol_cost),
        max_iter.or(defaults.tols.max_iter),
    )?;

    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name)?,
        None => defaults.line_searcher,
    };

    let opts =
        RootOptions::new(tols, tol_residual.unwrap_or(defaults.tol_residual), ls, false, lbfgs_mem)?;

    Ok(opts)
}
