//! Where matched records go.

/// A find destination: one shared record, or a list receiving a fresh record per match.
pub(crate) enum Sink<'a, R> {
    Record(&'a mut R),
    List(&'a mut Vec<R>),
}

impl<R> Sink<'_, R> {
    pub(crate) fn reborrow(&mut self) -> Sink<'_, R> {
        match self {
            Sink::Record(record) => Sink::Record(&mut **record),
            Sink::List(list) => Sink::List(&mut **list),
        }
    }
}
