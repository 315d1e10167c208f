//! Extraction unit contract and the per-phase unit lists
//!
//! A unit is an independently-fallible routine taking the page and the shared
//! task state and producing one side effect, usually one artifact file.

use anyhow::Result;
use futures::future::BoxFuture;

use super::page_state::PageState;

/// A plug-in unit run by the sequencer
pub trait ArchiveUnit<P: ?Sized>: Send + Sync {
    fn name(&self) -> &'static str;

    fn run<'a>(&'a self, page: &'a P, state: &'a PageState) -> BoxFuture<'a, Result<()>>;
}

/// Unit backed by a plain function or closure
pub struct FnUnit<F> {
    name: &'static str,
    f: F,
}

impl<P, F> ArchiveUnit<P> for FnUnit<F>
where
    P: ?Sized,
    F: for<'a> Fn(&'a P, &'a PageState) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn run<'a>(&'a self, page: &'a P, state: &'a PageState) -> BoxFuture<'a, Result<()>> {
        (self.f)(page, state)
    }
}

/// Box a function as a unit
///
/// ```rust,ignore
/// let title = unit("title", |page, state| Box::pin(save_title(page, state)));
/// ```
pub fn unit<P, F>(name: &'static str, f: F) -> Box<dyn ArchiveUnit<P>>
where
    P: ?Sized + 'static,
    F: for<'a> Fn(&'a P, &'a PageState) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Box::new(FnUnit { name, f })
}

pub type UnitList<P> = Vec<Box<dyn ArchiveUnit<P>>>;

/// Units grouped by the phase that runs them
///
/// Fan-out phases (`preparation`, `extraction`, `background`) run their units
/// concurrently; `behaviors`, `freeze` and `capture` run one unit at a time
/// with exclusive use of the page.
pub struct Pipeline<P: ?Sized> {
    pub preparation: UnitList<P>,
    pub behaviors: UnitList<P>,
    pub freeze: UnitList<P>,
    pub capture: UnitList<P>,
    pub extraction: UnitList<P>,
    pub background: UnitList<P>,
}

impl<P: ?Sized> Default for Pipeline<P> {
    fn default() -> Self {
        Self {
            preparation: Vec::new(),
            behaviors: Vec::new(),
            freeze: Vec::new(),
            capture: Vec::new(),
            extraction: Vec::new(),
            background: Vec::new(),
        }
    }
}

impl<P: ?Sized> Pipeline<P> {
    /// Names of every unit, grouped by phase, for startup logging
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, Vec<&'static str>)> {
        let names = |list: &UnitList<P>| list.iter().map(|u| u.name()).collect::<Vec<_>>();
        vec![
            ("preparation", names(&self.preparation)),
            ("behaviors", names(&self.behaviors)),
            ("freeze", names(&self.freeze)),
            ("capture", names(&self.capture)),
            ("extraction", names(&self.extraction)),
            ("background", names(&self.background)),
        ]
    }
}
