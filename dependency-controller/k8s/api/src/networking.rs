pub mod service_dependency;

pub use self::service_dependency::{
    Dependency, Import, ServiceDependency, ServiceDependencySpec,
};
