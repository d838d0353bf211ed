// Copyright 2023 Remi Bernotavicius

//! Whatever presents a list of entities (a table, a list of cards, a terminal) receives them
//! one `(id, entity)` pair at a time through [`EntityConsumer`].

pub trait EntityConsumer<IdT, T: ?Sized> {
    fn consume(&mut self, id: IdT, entity: &T);
}

impl<IdT, T: ?Sized, F> EntityConsumer<IdT, T> for F
where
    F: FnMut(IdT, &T),
{
    fn consume(&mut self, id: IdT, entity: &T) {
        self(id, entity)
    }
}

/// Hands every item to `consumer` in order and returns how many there were.
pub fn feed<'a, IdT, T: ?Sized + 'a>(
    items: impl IntoIterator<Item = (IdT, &'a T)>,
    consumer: &mut impl EntityConsumer<IdT, T>,
) -> usize {
    let mut count = 0;
    for (id, entity) in items {
        consumer.consume(id, entity);
        count += 1;
    }
    count
}
