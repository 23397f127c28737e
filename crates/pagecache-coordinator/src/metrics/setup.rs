//! Metrics setup and initialization.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

use super::cache::register_cache_metrics;

/// Inicializa el sistema de metricas y retorna el handle para renderizarlas.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    // Buckets para histogramas (en segundos); un hit de memoria ronda los microsegundos
    let handle = PrometheusBuilder::new()
        .set_buckets(&[
            0.00001, // 10 microsegundos
            0.0001,  // 100 microsegundos
            0.001,   // 1 milisegundo
            0.005,   // 5 milisegundos
            0.01,    // 10 milisegundos
            0.05,    // 50 milisegundos
            0.1,     // 100 milisegundos
            0.25,    // 250 milisegundos
            0.5,     // 500 milisegundos
            1.0,     // 1 segundo
            2.5,     // 2.5 segundos
            5.0,     // 5 segundos
        ])?
        .install_recorder()?;

    register_cache_metrics();
    info!("Metrics system initialized");
    Ok(handle)
}
