/*!
Client for [render-ws](https://github.com/saalfeldlab/render), the web service
behind large-scale microscopy tile stitching.

The crate covers the coordinate mapping endpoints (world ⇄ local, single
points and batches) and point match collections. Batches are exchanged as
`(n, 2)` [`ndarray`] arrays; large batches can optionally be computed locally by
the render Java `CoordinateClient` instead of the web service.

```no_run
use ndarray::array;
use render_api::coordinate::BatchMode;
use render_api::{RenderClient, RenderConfig};

# async fn run() -> render_api::RenderResult {
let client = RenderClient::new(RenderConfig::new("renderer.int", Some(8080), "flyTEM", "FAFB00"));

let local = array![[10.0, 20.0], [30.0, 40.0]];
let world = client
    .local_to_world_coordinates_array("v12_acquire", local.view(), "150311.1.0", 1.0, &BatchMode::Server)
    .await?;
# Ok(())
# }
```

## Logging

Every request is wrapped in a `tracing` span carrying the method and URL;
failures are logged at error level together with the raw response body. The
library never installs a subscriber.
*/

mod client;
mod config;
mod errors;

pub mod coordinate;
#[cfg(feature = "pointmatch")]
pub mod pointmatch;


pub use client::RenderClient;
pub use config::RenderConfig;
pub use errors::{RenderError, RenderResult};
