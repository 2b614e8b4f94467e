#![allow(dead_code)]

use majiang_engine::{Dispatch, Hand, SeatCommand, SeatId, Suit, Tile, TileKindSet, Wall};

/// 解析牌的简写：`123m` 万、`456p` 筒、`789s` 条、`1234567z` 字
pub fn tiles(notation: &str) -> Vec<Tile> {
    let mut result = Vec::new();
    let mut ranks = Vec::new();
    for ch in notation.chars() {
        match ch {
            '1'..='9' => ranks.push(ch as u8 - b'0'),
            'm' | 'p' | 's' | 'z' => {
                let suit = match ch {
                    'm' => Suit::Wan,
                    'p' => Suit::Tong,
                    's' => Suit::Tiao,
                    _ => Suit::Zi,
                };
                for rank in ranks.drain(..) {
                    result.push(Tile::new(suit, rank).expect("valid tile"));
                }
            }
            ' ' => {}
            other => panic!("unknown tile notation `{other}`"),
        }
    }
    assert!(ranks.is_empty(), "ranks without suit in `{notation}`");
    result
}

pub fn tile(notation: &str) -> Tile {
    let parsed = tiles(notation);
    assert_eq!(parsed.len(), 1, "`{notation}` is not a single tile");
    parsed[0]
}

pub fn hand(notation: &str) -> Hand {
    Hand::from_tiles(tiles(notation))
}

/// 按顺序排好的牌墙
///
/// - `deals`: 从庄家开始四家的起手牌（各 13 张）
/// - `draws`: 发完牌后依次摸到的牌
/// - `replacements`: 依次杠后补到的牌（从牌墙后端取）
///
/// 其余的牌按牌种顺序填在中间，保证每种牌不超过 4 张
pub fn stacked_wall(pool: TileKindSet, deals: [&str; 4], draws: &str, replacements: &str) -> Wall {
    let mut front = Vec::new();
    for deal in deals {
        let dealt = tiles(deal);
        assert_eq!(dealt.len(), 13, "deal `{deal}` must hold 13 tiles");
        front.extend(dealt);
    }
    front.extend(tiles(draws));
    let back = tiles(replacements);

    let mut left = [0u8; Tile::KIND_COUNT];
    for tile in pool {
        left[tile.kind_index()] = Tile::COPIES;
    }
    for tile in front.iter().chain(back.iter()) {
        let slot = &mut left[tile.kind_index()];
        assert!(*slot > 0, "too many copies of {tile}");
        *slot -= 1;
    }

    let mut wall = front;
    for tile in pool {
        for _ in 0..left[tile.kind_index()] {
            wall.push(tile);
        }
    }
    wall.extend(back.into_iter().rev());
    Wall::from_tiles(wall)
}

/// 发给某个座位的命令名
pub fn commands_for(out: &[Dispatch], seat: SeatId) -> Vec<&'static str> {
    out.iter()
        .filter_map(|dispatch| match dispatch {
            Dispatch::Seat { to, command } if *to == seat => Some(command.name()),
            _ => None,
        })
        .collect()
}

/// 输出中的摸牌命令（座位、牌事件）
pub fn new_tiles(out: &[Dispatch]) -> Vec<(SeatId, u64)> {
    out.iter()
        .filter_map(|dispatch| match dispatch {
            Dispatch::Seat {
                to,
                command: SeatCommand::NewTile { info, .. },
            } => Some((*to, info.event)),
            _ => None,
        })
        .collect()
}
