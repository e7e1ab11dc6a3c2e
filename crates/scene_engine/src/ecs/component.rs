//! Component trait and implementations

/// Marker trait for components
pub trait Component: 'static + Send + Sync {
    /// Short name used in diagnostics
    const NAME: &'static str;
}

impl Component for crate::ecs::components::TransformComponent {
    const NAME: &'static str = "Transform";
}

impl Component for crate::ecs::components::HierarchyComponent {
    const NAME: &'static str = "HierarchyLink";
}

impl Component for crate::ecs::components::BoundsComponent {
    const NAME: &'static str = "Bounds";
}
