//! View — ordered best-match body renderers
//!
//! Views declare themselves via [`View::spec`]: a simple name, an order and
//! an applicability filter. The registry groups views by order (groups in
//! registration order), accepts at most one winner per group, and across
//! groups the numerically highest order wins — so a general wrapper at a
//! low order is overridden by a more specific view at a higher order.

use crate::control::ViewParams;
use crate::{ActionError, DispatchError, Request, Response};

/// Applicability filter over controller and action names.
///
/// An empty list — or one containing the literal `any` — admits everything.
#[derive(Debug, Clone, Default)]
pub struct AppliesTo {
    controllers: Vec<String>,
    actions: Vec<String>,
}

impl AppliesTo {
    /// A filter admitting every controller and action.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse the filter grammar `controller=<a|b|any>,action=<a|b|any>`.
    ///
    /// Both clauses are optional; an empty string admits everything.
    ///
    /// # Errors
    ///
    /// A clause without `=` or with a key other than `controller`/`action`
    /// is rejected with a description of the offending clause.
    pub fn parse(filter: &str) -> Result<Self, String> {
        let mut applies = Self::default();
        for clause in filter.split(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let (key, value) = clause
                .split_once('=')
                .ok_or_else(|| format!("clause \"{clause}\" is not key=value"))?;
            let names = value.split('|').map(|n| n.trim().to_string()).collect();
            match key.trim() {
                "controller" => applies.controllers = names,
                "action" => applies.actions = names,
                other => return Err(format!("unknown filter key \"{other}\"")),
            }
        }
        Ok(applies)
    }

    /// Whether the filter admits the given controller.
    pub fn admits_controller(&self, controller: &str) -> bool {
        self.controllers.is_empty()
            || self.controllers.iter().any(|c| c == "any" || c == controller)
    }

    /// Whether the filter admits the given action.
    pub fn admits_action(&self, action: &str) -> bool {
        self.actions.is_empty() || self.actions.iter().any(|a| a == "any" || a == action)
    }

    /// Whether the filter admits both names.
    pub fn admits(&self, controller: &str, action: &str) -> bool {
        self.admits_controller(controller) && self.admits_action(action)
    }
}

/// Self-description of a view: simple name, intrinsic order, filter.
#[derive(Debug, Clone)]
pub struct ViewSpec {
    name: String,
    order: i32,
    applies_to: String,
}

impl ViewSpec {
    /// Describe a view under an explicit simple name, at order 0, admitting
    /// everything.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: 0,
            applies_to: String::new(),
        }
    }

    /// Describe a view named after the implementing type, with a trailing
    /// `View` token stripped.
    #[must_use]
    pub fn for_type<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        let short = short.split('<').next().unwrap_or(short);
        Self::new(short.strip_suffix("View").unwrap_or(short))
    }

    /// Set the intrinsic order. An explicit order given at registration
    /// wins over this.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Set the applicability filter, in the grammar accepted by
    /// [`AppliesTo::parse`].
    #[must_use]
    pub fn applying_to(mut self, filter: impl Into<String>) -> Self {
        self.applies_to = filter.into();
        self
    }

    /// The view simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The intrinsic order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// The applicability filter, unparsed.
    pub fn applies_to(&self) -> &str {
        &self.applies_to
    }
}

/// Additional assets handed to views for inclusion in a rendered document.
#[derive(Debug, Clone, Default)]
pub struct PageAssets {
    /// Stylesheet URIs.
    pub css_files: Vec<String>,
    /// Script URIs.
    pub js_files: Vec<String>,
}

/// A renderer responsible for wrapping/transforming a response body.
///
/// `render` may rewrite the body (e.g. wrap it in a document shell) but
/// must not alter the status code or content type unless that is its
/// documented purpose.
pub trait View: Send + Sync {
    /// Self-description, computed once at registration time.
    fn spec(&self) -> ViewSpec;

    /// Render the response for the given request.
    ///
    /// # Errors
    ///
    /// A failure is recovered once per dispatch cycle by rerouting to the
    /// error controller's `exception` action.
    fn render(
        &self,
        response: &mut Response,
        request: &Request,
        params: &ViewParams,
        assets: &PageAssets,
    ) -> Result<(), ActionError>;
}

/// Registry entry for one view: cached name, resolved order, parsed filter
/// and the instance.
pub struct ViewDescriptor {
    name: String,
    order: i32,
    applies_to: AppliesTo,
    instance: Box<dyn View>,
}

impl ViewDescriptor {
    /// Cache a view's self-description for registration. An explicit order
    /// override wins over the view's intrinsic default.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ViewResolution`] when the name is empty or the
    /// applicability filter does not parse.
    pub fn describe(
        instance: Box<dyn View>,
        order_override: Option<i32>,
    ) -> Result<Self, DispatchError> {
        let spec = instance.spec();
        if spec.name().is_empty() {
            return Err(DispatchError::ViewResolution {
                name: String::new(),
                reason: "derived view name is empty".to_string(),
            });
        }
        let applies_to =
            AppliesTo::parse(spec.applies_to()).map_err(|reason| DispatchError::ViewResolution {
                name: spec.name().to_string(),
                reason,
            })?;
        Ok(Self {
            name: spec.name().to_string(),
            order: order_override.unwrap_or(spec.order()),
            applies_to,
            instance,
        })
    }

    /// The view simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Whether this view admits the controller/action pair.
    pub fn matches(&self, controller: &str, action: &str) -> bool {
        self.applies_to.admits(controller, action)
    }

    /// Render through the registered instance.
    pub(crate) fn render(
        &self,
        response: &mut Response,
        request: &Request,
        params: &ViewParams,
        assets: &PageAssets,
    ) -> Result<(), ActionError> {
        self.instance.render(response, request, params, assets)
    }
}

impl std::fmt::Debug for ViewDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewDescriptor")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish()
    }
}

/// Per-application view store with best-match selection.
#[derive(Debug, Default)]
pub(crate) struct ViewRegistry {
    /// Order groups, in first-seen registration order.
    groups: Vec<OrderGroup>,
}

#[derive(Debug)]
struct OrderGroup {
    order: i32,
    views: Vec<ViewDescriptor>,
}

impl ViewRegistry {
    /// Store a descriptor in its order group. A descriptor with the same
    /// name and order replaces the earlier registration.
    pub(crate) fn add(&mut self, descriptor: ViewDescriptor) {
        match self.groups.iter_mut().find(|g| g.order == descriptor.order()) {
            Some(group) => match group.views.iter_mut().find(|v| v.name() == descriptor.name()) {
                Some(slot) => *slot = descriptor,
                None => group.views.push(descriptor),
            },
            None => self.groups.push(OrderGroup {
                order: descriptor.order(),
                views: vec![descriptor],
            }),
        }
    }

    /// Remove the named view from the given order group. Idempotent;
    /// absence is not an error.
    pub(crate) fn remove(&mut self, name: &str, order: i32) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.order == order) {
            group.views.retain(|v| v.name() != name);
        }
    }

    /// Select the best-matching view for a controller/action pair.
    ///
    /// Groups are scanned in registration order; within a group the first
    /// admitting view wins and the rest of the group is skipped. Across
    /// groups, the winner with the numerically highest order is selected.
    pub(crate) fn select_best(&self, controller: &str, action: &str) -> Option<&ViewDescriptor> {
        let mut winner: Option<(i32, &ViewDescriptor)> = None;
        for group in &self.groups {
            if let Some(view) = group.views.iter().find(|v| v.matches(controller, action)) {
                if winner.map_or(true, |(order, _)| group.order > order) {
                    winner = Some((group.order, view));
                }
            }
        }
        winner.map(|(_, view)| view)
    }
}
