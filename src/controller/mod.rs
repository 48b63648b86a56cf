//! Controller artefacts: descriptors, the ordered registry, and source scanning.
//!
//! Controllers are discovered from `*_controller.soli` files:
//!
//! ```soli
//! class PostsController extends ApplicationController {
//!     static {
//!         this.namespace = "admin";
//!     }
//!
//!     fn index(req: Any) -> Any {
//!         return render("posts/index", { "posts": Post.all() });
//!     }
//!
//!     # Private helper (not exposed as action)
//!     fn _load_post(req: Any) -> Any {
//!         return Post.find(req.params["id"]);
//!     }
//! }
//! ```
//!
//! which registers `PostsController` in namespace `admin`, mapping `/posts`,
//! `/posts/**`, `/posts/index` and `/posts/index/**`.

pub mod descriptor;
pub mod registry;
pub mod scanner;

pub use descriptor::{ControllerDescriptor, UriMapping};
pub use registry::{ControllerRegistry, ControllerSource};
pub use scanner::{load_application, load_application_into, LoadedApplication};
