//! Static tile classification and the routes derived from it.

use std::collections::{BTreeMap, BTreeSet};

use home_defence_core::{ConfigError, SpawnPointId, TileCoord, TileDirection, Vec2};

/// Classification of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    direction: TileDirection,
    decorated: bool,
    has_tower: bool,
}

impl Tile {
    /// Path classification of the tile.
    #[must_use]
    pub const fn direction(&self) -> TileDirection {
        self.direction
    }

    /// Indicates whether scenery blocks construction on the tile.
    #[must_use]
    pub const fn decorated(&self) -> bool {
        self.decorated
    }

    /// Indicates whether a tower stands on the tile.
    #[must_use]
    pub const fn has_tower(&self) -> bool {
        self.has_tower
    }

    /// Reports whether a tower may be constructed on the tile.
    #[must_use]
    pub const fn is_placeable(&self) -> bool {
        matches!(self.direction, TileDirection::None) && !self.decorated && !self.has_tower
    }
}

/// Describes the discrete tile layout of the map.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
    home: TileCoord,
    spawn_points: BTreeMap<SpawnPointId, TileCoord>,
}

impl TileGrid {
    /// Builds a grid from legend rows.
    ///
    /// `.` is buildable ground, `#` decorated ground, `^`, `v`, `<` and `>`
    /// are path segments pointing in the direction of travel and `H` is home.
    /// Whitespace is ignored so rows may be indented.
    pub fn from_rows<S>(rows: &[S]) -> Result<Self, ConfigError>
    where
        S: AsRef<str>,
    {
        let mut tiles = Vec::new();
        let mut columns: Option<u32> = None;
        let mut home: Option<TileCoord> = None;
        let mut row_count = 0u32;

        for (row_index, row) in rows.iter().enumerate() {
            let row_index = u32::try_from(row_index).map_err(|_| ConfigError::EmptyGrid)?;
            let mut width = 0u32;
            for symbol in row.as_ref().chars().filter(|symbol| !symbol.is_whitespace()) {
                let tile = TileCoord::new(width, row_index);
                let (direction, decorated) = match symbol {
                    '.' => (TileDirection::None, false),
                    '#' => (TileDirection::None, true),
                    '^' => (TileDirection::Up, false),
                    'v' => (TileDirection::Down, false),
                    '<' => (TileDirection::Left, false),
                    '>' => (TileDirection::Right, false),
                    'H' => (TileDirection::Home, false),
                    other => {
                        return Err(ConfigError::UnknownTileSymbol {
                            symbol: other,
                            tile,
                        })
                    }
                };

                if direction == TileDirection::Home {
                    if let Some(first) = home {
                        return Err(ConfigError::MultipleHomes {
                            first,
                            second: tile,
                        });
                    }
                    home = Some(tile);
                }

                tiles.push(Tile {
                    direction,
                    decorated,
                    has_tower: false,
                });
                width += 1;
            }

            match columns {
                None => columns = Some(width),
                Some(expected) if expected != width => {
                    return Err(ConfigError::RaggedGrid {
                        row: row_index,
                        expected,
                        found: width,
                    })
                }
                Some(_) => {}
            }
            row_count = row_index + 1;
        }

        let columns = columns.unwrap_or(0);
        if columns == 0 || row_count == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let home = home.ok_or(ConfigError::MissingHome)?;

        Ok(Self {
            columns,
            rows: row_count,
            tiles,
            home,
            spawn_points: BTreeMap::new(),
        })
    }

    /// Registers a spawn point. Validity is checked when routes are derived.
    #[must_use]
    pub fn with_spawn_point(mut self, id: SpawnPointId, tile: TileCoord) -> Self {
        let _ = self.spawn_points.insert(id, tile);
        self
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile enemies try to reach.
    #[must_use]
    pub const fn home(&self) -> TileCoord {
        self.home
    }

    /// Registered spawn points in identifier order.
    pub fn spawn_points(&self) -> impl Iterator<Item = (SpawnPointId, TileCoord)> + '_ {
        self.spawn_points.iter().map(|(id, tile)| (*id, *tile))
    }

    /// Reports whether the spawn point was registered.
    #[must_use]
    pub fn has_spawn_point(&self, id: SpawnPointId) -> bool {
        self.spawn_points.contains_key(&id)
    }

    /// Retrieves the tile at the provided coordinate.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).and_then(|index| self.tiles.get(index))
    }

    /// Reports whether a tower may be constructed at the coordinate.
    ///
    /// Coordinates outside the grid are never placeable.
    #[must_use]
    pub fn is_placeable(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_some_and(Tile::is_placeable)
    }

    /// Total width of the grid in world units.
    #[must_use]
    pub fn width(&self, tile_size: f32) -> f32 {
        self.columns as f32 * tile_size
    }

    /// Total height of the grid in world units.
    #[must_use]
    pub fn height(&self, tile_size: f32) -> f32 {
        self.rows as f32 * tile_size
    }

    pub(crate) fn set_tower(&mut self, coord: TileCoord, has_tower: bool) {
        if let Some(index) = self.index(coord) {
            if let Some(tile) = self.tiles.get_mut(index) {
                tile.has_tower = has_tower;
            }
        }
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.column() < self.columns && coord.row() < self.rows {
            let row = usize::try_from(coord.row()).ok()?;
            let column = usize::try_from(coord.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Ordered tile-centre waypoints leading from a spawn point to home.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    spawn_point: SpawnPointId,
    tiles: Vec<TileCoord>,
    waypoints: Vec<Vec2>,
    cumulative: Vec<f32>,
}

impl Route {
    /// Follows tile directions from the spawn point until home is reached.
    pub fn derive(
        grid: &TileGrid,
        spawn_point: SpawnPointId,
        tile_size: f32,
    ) -> Result<Self, ConfigError> {
        let start = grid
            .spawn_points
            .get(&spawn_point)
            .copied()
            .ok_or(ConfigError::InvalidSpawnPoint {
                spawn_point,
                tile: TileCoord::new(u32::MAX, u32::MAX),
            })?;
        let on_path = grid
            .tile(start)
            .is_some_and(|tile| tile.direction().is_path());
        if !on_path {
            return Err(ConfigError::InvalidSpawnPoint {
                spawn_point,
                tile: start,
            });
        }

        let mut visited = BTreeSet::new();
        let mut tiles = Vec::new();
        let mut current = start;

        loop {
            if !visited.insert(current) {
                return Err(ConfigError::RouteLoops {
                    spawn_point,
                    tile: current,
                });
            }
            tiles.push(current);

            let direction = grid
                .tile(current)
                .map(Tile::direction)
                .ok_or(ConfigError::RouteLeavesGrid {
                    spawn_point,
                    tile: current,
                })?;

            match direction {
                TileDirection::Home => break,
                TileDirection::None => {
                    return Err(ConfigError::RouteInterrupted {
                        spawn_point,
                        tile: current,
                    })
                }
                TileDirection::Up
                | TileDirection::Down
                | TileDirection::Left
                | TileDirection::Right => {
                    let next = current
                        .step(direction)
                        .filter(|next| grid.tile(*next).is_some())
                        .ok_or(ConfigError::RouteLeavesGrid {
                            spawn_point,
                            tile: current,
                        })?;
                    current = next;
                }
            }
        }

        let waypoints: Vec<Vec2> = tiles.iter().map(|tile| tile.center(tile_size)).collect();
        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut travelled = 0.0;
        for (index, waypoint) in waypoints.iter().enumerate() {
            if index > 0 {
                travelled += waypoints[index - 1].distance(*waypoint);
            }
            cumulative.push(travelled);
        }

        Ok(Self {
            spawn_point,
            tiles,
            waypoints,
            cumulative,
        })
    }

    /// Spawn point the route starts from.
    #[must_use]
    pub const fn spawn_point(&self) -> SpawnPointId {
        self.spawn_point
    }

    /// Tiles visited by the route, home last.
    #[must_use]
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    /// World-space waypoints, one per tile centre.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Total arc length of the route in world units.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position reached after travelling `progress` world units, clamped to the route.
    #[must_use]
    pub fn position_at(&self, progress: f32) -> Vec2 {
        let Some(first) = self.waypoints.first().copied() else {
            return Vec2::ZERO;
        };
        if progress <= 0.0 {
            return first;
        }

        let segment = self
            .cumulative
            .partition_point(|distance| *distance <= progress);
        if segment >= self.waypoints.len() {
            return self.waypoints.last().copied().unwrap_or(first);
        }

        let from = self.waypoints[segment - 1];
        let to = self.waypoints[segment];
        let start = self.cumulative[segment - 1];
        let span = self.cumulative[segment] - start;
        if span <= 0.0 {
            return to;
        }
        from.lerp(to, (progress - start) / span)
    }
}
